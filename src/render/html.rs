//! Leaflet page for a [`MapDocument`]
//!
//! The page is a fixed template. The document is embedded as JSON and the
//! script at the bottom draws it; checkbox changes post the form back, and
//! the last map center and zoom travel along in hidden fields.

use crate::error::Result;
use crate::render::MapDocument;

const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="fr">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    body { display: flex; font-family: sans-serif; margin: 0; }
    aside { width: 18rem; padding: 1rem; background: #f0f2f6; min-height: 100vh; font-size: 0.85rem; }
    main { padding: 1rem 2rem; }
    .filters { display: grid; grid-template-columns: 1fr 1fr; gap: 0.25rem 2rem; margin-bottom: 1rem; }
    #map { width: {{WIDTH}}px; height: {{HEIGHT}}px; }
    .legend { background: white; padding: 6px 8px; border-radius: 4px; font-size: 11px; }
    .legend .bar { width: 300px; height: 12px; }
    .legend .ticks { display: flex; justify-content: space-between; width: 300px; }
  </style>
</head>
<body>
  <aside>
    <h3>Infos système</h3>
    <p>Version: {{VERSION}}</p>
    <p>Plateforme: {{PLATFORM}}</p>
    <p>Répertoire courant: {{WORKING_DIR}}</p>
  </aside>
  <main>
    <h1>{{TITLE}}</h1>
    <form id="filters" method="post" action="/interact">
      <div class="filters">
        <label><input type="checkbox" name="middle" {{MIDDLE}} onchange="this.form.submit()" /> Afficher les Collèges</label>
        <label><input type="checkbox" name="public" {{PUBLIC}} onchange="this.form.submit()" /> Afficher les établissements publics</label>
        <label><input type="checkbox" name="high" {{HIGH}} onchange="this.form.submit()" /> Afficher les Lycées</label>
        <label><input type="checkbox" name="private" {{PRIVATE}} onchange="this.form.submit()" /> Afficher les établissements privés</label>
      </div>
      <input type="hidden" name="lat" id="lat" />
      <input type="hidden" name="lon" id="lon" />
      <input type="hidden" name="zoom" id="zoom" />
    </form>
    <div id="map"></div>
  </main>
  <script>
    const doc = {{DOCUMENT}};

    const map = L.map("map").setView([doc.viewport.center.lat, doc.viewport.center.lon], doc.viewport.zoom);
    L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", {
      attribution: "&copy; OpenStreetMap contributors",
    }).addTo(map);

    L.geoJSON(doc.boundary.geometry, {
      style: { color: doc.boundary.color, weight: doc.boundary.weight, fill: doc.boundary.fill },
    }).addTo(map);

    const schools = L.featureGroup();
    for (const m of doc.schools.markers) {
      L.circleMarker([m.location.lat, m.location.lon], {
        radius: m.radius,
        color: m.color,
        fill: true,
        fillColor: m.fill_color,
        fillOpacity: m.fill_opacity,
      }).bindPopup(m.popup).addTo(schools);
    }
    schools.addTo(map);
    L.control.layers(null, { [doc.schools.name]: schools }).addTo(map);

    const legend = L.control({ position: "topright" });
    legend.onAdd = () => {
      const div = L.DomUtil.create("div", "legend");
      const stops = doc.legend.colors.map((c, i) => `${c} ${(100 * i) / (doc.legend.colors.length - 1)}%`);
      div.innerHTML =
        `<div class="bar" style="background: linear-gradient(to right, ${stops.join(", ")})"></div>` +
        `<div class="ticks">${doc.legend.ticks.map((t) => `<span>${t.toFixed(1)}</span>`).join("")}</div>` +
        `<div>${doc.legend.caption}</div>`;
      return div;
    };
    legend.addTo(map);

    map.on("moveend", () => {
      const center = map.getCenter();
      document.getElementById("lat").value = center.lat;
      document.getElementById("lon").value = center.lng;
      document.getElementById("zoom").value = map.getZoom();
    });
  </script>
</body>
</html>
"#;

/// Escape text for inclusion in HTML element content or attribute values
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn checked(on: bool) -> &'static str {
    if on { "checked" } else { "" }
}

impl MapDocument {
    /// The full page for this document
    pub fn to_html(&self) -> Result<String> {
        // `</` inside a script block would end it early.
        let document = serde_json::to_string(self)?.replace("</", "<\\/");
        let flags = &self.flags;

        Ok(PAGE_TEMPLATE
            .replace("{{TITLE}}", &escape_html(&self.title))
            .replace("{{WIDTH}}", &self.width.to_string())
            .replace("{{HEIGHT}}", &self.height.to_string())
            .replace("{{VERSION}}", &escape_html(&self.diagnostics.version))
            .replace("{{PLATFORM}}", &escape_html(&self.diagnostics.platform))
            .replace("{{WORKING_DIR}}", &escape_html(&self.diagnostics.working_dir))
            .replace("{{MIDDLE}}", checked(flags.show_middle))
            .replace("{{HIGH}}", checked(flags.show_high))
            .replace("{{PUBLIC}}", checked(flags.show_public))
            .replace("{{PRIVATE}}", checked(flags.show_private))
            .replace("{{DOCUMENT}}", &document))
    }
}
