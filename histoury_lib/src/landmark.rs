use serde::Serialize;

/// Searches shorter than this return nothing.
pub const MIN_SEARCH_LENGTH: usize = 3;
pub const EXCERPT_LENGTH: usize = 80;

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub name: &'static str,
    pub location: &'static str,
    pub description: &'static str,
    pub image_src: &'static str,
    pub slug: &'static str,
}

const CATALOG: [Landmark; 12] = [
    Landmark {
        name: "Ajanta Caves",
        location: "Aurangabad, Maharashtra",
        description: "Buddhist rock-cut cave monuments with paintings and sculptures dating from the 2nd century BCE.",
        image_src: "/images/ajanta_caves.jpg",
        slug: "ajanta-caves",
    },
    Landmark {
        name: "Victoria Memorial",
        location: "Kolkata, West Bengal",
        description: "Magnificent white marble monument blending British and Mughal elements.",
        image_src: "/images/victoria_memorial.jpg",
        slug: "victoria-memorial",
    },
    Landmark {
        name: "Taj Mahal",
        location: "Agra, Uttar Pradesh",
        description: "Iconic white marble mausoleum built by Mughal Emperor Shah Jahan in memory of his wife Mumtaz Mahal.",
        image_src: "/images/taj_mahal.jpg",
        slug: "taj-mahal",
    },
    Landmark {
        name: "Gateway of India",
        location: "Mumbai, Maharashtra",
        description: "Iconic monument built to commemorate the visit of King George V and Queen Mary to Mumbai.",
        image_src: "/images/gateway_of_india.jpg",
        slug: "gateway-of-india",
    },
    Landmark {
        name: "Qutub Minar",
        location: "Delhi",
        description: "UNESCO World Heritage Site, the tallest brick minaret in the world standing at 73 meters.",
        image_src: "/images/qutub_minar.jpg",
        slug: "qutub-minar",
    },
    Landmark {
        name: "Khajuraho Temples",
        location: "Madhya Pradesh",
        description: "Known for their Nagara-style architectural symbolism and erotic sculptures, built between 950-1050 CE.",
        image_src: "/images/khajuraho_temples.jpg",
        slug: "khajuraho-temples",
    },
    Landmark {
        name: "Ellora Caves",
        location: "Aurangabad, Maharashtra",
        description: "Ancient rock-cut caves featuring Buddhist, Hindu and Jain monuments with remarkable sculptures.",
        image_src: "/images/ellora_caves.jpg",
        slug: "ellora-caves",
    },
    Landmark {
        name: "Hawa Mahal",
        location: "Jaipur, Rajasthan",
        description: "Palace of winds featuring a unique five-story exterior with 953 small windows called jharokhas.",
        image_src: "/images/hawa_mahal.jpg",
        slug: "hawa-mahal",
    },
    Landmark {
        name: "Golden Temple",
        location: "Amritsar, Punjab",
        description: "Most significant shrine in Sikhism, known officially as Harmandir Sahib or Darbar Sahib.",
        image_src: "/images/golden_temple.jpg",
        slug: "golden-temple",
    },
    Landmark {
        name: "Mysore Palace",
        location: "Mysore, Karnataka",
        description: "Historical palace that was the official residence of the Wadiyar dynasty, rulers of Mysore.",
        image_src: "/images/mysore_palace.jpg",
        slug: "mysore-palace",
    },
    Landmark {
        name: "Sun Temple",
        location: "Konark, Odisha",
        description: "13th-century temple dedicated to the sun god Surya, known for its intricate stone carvings.",
        image_src: "/images/sun_temple.jpg",
        slug: "sun-temple",
    },
    Landmark {
        name: "Meenakshi Temple",
        location: "Madurai, Tamil Nadu",
        description: "Ancient Hindu temple dedicated to Goddess Meenakshi with thousands of colorful sculptures.",
        image_src: "/images/meenakshi_temple.jpg",
        slug: "meenakshi-temple",
    },
];

const SUGGESTED_SLUGS: [&str; 3] = ["ajanta-caves", "ellora-caves", "hawa-mahal"];

pub fn catalog() -> &'static [Landmark] {
    &CATALOG
}

pub fn find_by_slug(slug: &str) -> Option<&'static Landmark> {
    CATALOG.iter().find(|landmark| landmark.slug == slug)
}

/// Loose name lookup, used to link recognizer output such as "Sun Temple Konark" to a catalog page.
pub fn find_by_name(name: &str) -> Option<&'static Landmark> {
    let name = name.trim().to_lowercase();
    if name.chars().count() < MIN_SEARCH_LENGTH {
        return None;
    }

    CATALOG.iter().find(|landmark| {
        let candidate = landmark.name.to_lowercase();
        candidate.contains(&name) || name.contains(&candidate)
    })
}

pub fn suggestions() -> Vec<&'static Landmark> {
    SUGGESTED_SLUGS.iter().filter_map(|slug| find_by_slug(slug)).collect()
}

/// Name-only search over the catalog, best matches first.
pub fn search(term: &str) -> Vec<&'static Landmark> {
    let term = term.trim();
    if term.chars().count() < MIN_SEARCH_LENGTH {
        return Vec::new();
    }

    let lower_term = term.to_lowercase();
    let mut results: Vec<(f64, &'static Landmark)> = CATALOG
        .iter()
        .filter(|landmark| landmark.name.to_lowercase().contains(&lower_term))
        .map(|landmark| (relevance_score(landmark.name, &lower_term), landmark))
        .collect();

    // Stable, so equal scores keep catalog order
    results.sort_by(|a, b| b.0.total_cmp(&a.0));
    results.into_iter().map(|(_, landmark)| landmark).collect()
}

/// Scores how well `name` matches an already lower-cased search term.
pub fn relevance_score(name: &str, lower_term: &str) -> f64 {
    let lower_name = name.to_lowercase();

    let mut score = if lower_name == lower_term {
        100.
    } else if lower_name.starts_with(lower_term) {
        80.
    } else if lower_name.split(' ').any(|word| word.starts_with(lower_term)) {
        70.
    } else if lower_name.contains(lower_term) {
        60.
    } else {
        0.
    };

    // Shorter names are more specific matches
    let length = lower_name.chars().count().min(20);
    score += (20 - length) as f64 / 2.;

    score
}

pub fn excerpt(description: &str) -> String {
    if description.chars().count() > EXCERPT_LENGTH {
        let cut: String = description.chars().take(EXCERPT_LENGTH).collect();
        format!("{cut}...")
    } else {
        description.to_string()
    }
}
