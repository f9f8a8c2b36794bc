use serde::Serialize;

use crate::places::LatLng;

/// Labels emitted by the landmark classifier, mapped to display name and position.
const LABELS: [(&str, &str, f64, f64); 24] = [
    ("Ajanta Caves", "Ajanta Caves", 20.5513, 75.7069),
    ("alai_darwaza", "Alai Darwaza", 28.5242, 77.1857),
    ("alai_minar", "Alai Minar", 28.5258, 77.1853),
    ("basilica_of_bom_jesus", "Basilica Of Bom Jesus", 15.5008, 73.9115),
    ("Charar-E- Sharif", "Charar-i-Sharief", 33.8629, 74.7663),
    ("charminar", "Charminar", 17.3616, 78.4747),
    ("Chhota_Imambara", "Chota Imambada", 26.8745, 80.9045),
    ("Ellora Caves", "Ellora Caves", 20.0268, 75.1771),
    ("Fatehpur Sikri", "Fatehpur Sikri", 27.0945, 77.6679),
    ("Gateway of India", "Gateway of India", 18.9220, 72.8347),
    ("golden temple", "Golden Temple", 31.6200, 74.8765),
    ("hawa mahal pics", "Hawa Mahal", 26.9240, 75.8267),
    ("Humayun_s Tomb", "Humayun's Tomb", 28.5933, 77.2507),
    ("India gate pics", "India Gate", 28.6129, 77.2295),
    ("iron_pillar", "Iron Pillar", 28.5247, 77.1850),
    ("jamali_kamali_tomb", "Jamali Kamali Mosque and Tomb", 28.5196, 77.1871),
    ("Khajuraho", "Khajuraho", 24.8318, 79.9199),
    ("lotus_temple", "Lotus Temple", 28.5535, 77.2588),
    ("mysore_palace", "Mysore Palace", 12.3052, 76.6552),
    ("qutub_minar", "Qutub Minar", 28.5245, 77.1855),
    ("Sun Temple Konark", "Sun Temple Konark", 19.8876, 86.0945),
    ("tajmahal", "Taj Mahal", 27.1751, 78.0421),
    ("tanjavur temple", "Brihadisvara Temple", 11.2062, 79.4488),
    ("victoria memorial", "Victoria Memorial", 22.5448, 88.3426),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedLandmark {
    pub name: String,
    pub location: LatLng,
}

/// Lower-cases and collapses `_`, `-` and runs of whitespace into single spaces.
fn normalize(label: &str) -> String {
    label
        .to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn resolve_label(label: &str) -> Option<RecognizedLandmark> {
    let wanted = normalize(label);
    LABELS
        .iter()
        .find(|(raw, _, _, _)| normalize(raw) == wanted)
        .map(|&(_, name, lat, lng)| RecognizedLandmark {
            name: name.to_string(),
            location: LatLng::new(lat, lng),
        })
}
