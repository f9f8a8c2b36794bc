pub mod gpx_util;
pub mod map_html;
