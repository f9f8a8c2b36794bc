use std::fmt::Write;

use histoury_lib::places::NearbyPlaces;

const LEAFLET_VERSION: &str = "1.9.4";
const ZOOM: u8 = 15;

/// A standalone Leaflet page showing the landmark and the places around it.
pub fn render_map(places: &NearbyPlaces) -> String {
    let origin = places.landmark_location;

    let mut markers = String::new();
    for place in &places.nearby_places {
        let popup = format!(
            "<b>{}</b><br>Type: {}<br>Address: {}<br>Distance: {} km<br><a href=\"{}\" target=\"_blank\">Get Directions</a>",
            escape_html(&place.name),
            place.category,
            escape_html(place.address.as_deref().unwrap_or("")),
            place.distance_km,
            escape_html(&place.route_url),
        );

        // Writing to a String cannot fail
        let _ = writeln!(
            markers,
            "L.circleMarker([{}, {}], {{radius: 8, color: \"{}\", fillOpacity: 0.8}}).addTo(map).bindPopup({}, {{maxWidth: 250}});",
            place.lat,
            place.lng,
            place.marker_color,
            js_string(&popup),
        );
    }

    format!(r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Nearby places</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([{lat}, {lng}], {ZOOM});
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
    maxZoom: 19,
    attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
L.marker([{lat}, {lng}]).addTo(map).bindPopup("You are here");
{markers}</script>
</body>
</html>
"#, lat = origin.lat, lng = origin.lng)
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// A JavaScript string literal. `</` is broken up so the text cannot close the script tag.
fn js_string(text: &str) -> String {
    serde_json::to_string(text)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}
