//! Self-contained HTML document for a render spec.
//!
//! The render spec is embedded as JSON and drawn client-side with Leaflet. Each
//! z-index slot gets its own map pane so the draw order holds whatever
//! order the layers are toggled in.

use std::io::Write;
use std::path::Path;

use atlas_common::{AtlasError, AtlasResult};
use chrono::{SecondsFormat, Utc};
use overlay_pipeline::RenderSpec;
use tempfile::NamedTempFile;
use tracing::debug;

const LEAFLET_VERSION: &str = "1.9.4";
const MARKERCLUSTER_VERSION: &str = "1.5.3";
const AWESOME_MARKERS_VERSION: &str = "2.0.2";
const FONT_AWESOME_VERSION: &str = "4.7.0";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<meta name="generator" content="map-builder __GENERATED__">
<title>__TITLE__</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/MarkerCluster.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/MarkerCluster.Default.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/__AWESOME__/leaflet.awesome-markers.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/__FA__/css/font-awesome.min.css">
<script src="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/leaflet.markercluster.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/__AWESOME__/leaflet.awesome-markers.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; }
.map-legend { background: white; padding: 8px 10px; border: 1px solid #999; border-radius: 4px;
              font: 13px/1.4 sans-serif; box-shadow: 0 1px 4px rgba(0,0,0,0.3); }
.map-legend .swatch { display: inline-block; width: 14px; height: 14px; margin-right: 6px;
                      vertical-align: middle; opacity: 0.8; }
</style>
</head>
<body>
<div id="map"></div>
<script id="render-spec" type="application/json">__SPEC__</script>
<script>
(function () {
  var spec = JSON.parse(document.getElementById("render-spec").textContent);
  var map = L.map("map", { center: spec.center, zoom: spec.zoom });

  L.tileLayer(spec.basemap.url, { attribution: spec.basemap.attribution }).addTo(map);

  var overlays = {};
  spec.layers.forEach(function (layer) {
    var pane = "slot-" + layer.z_index;
    if (!map.getPane(pane)) {
      map.createPane(pane).style.zIndex = layer.z_index;
    }
    if (!layer.interactive) {
      map.getPane(pane).style.pointerEvents = "none";
    }

    var leafletLayer;
    if (layer.kind === "vector") {
      leafletLayer = L.geoJSON(layer.data, {
        pane: pane,
        interactive: layer.interactive,
        style: function () { return layer.style; },
        onEachFeature: function (feature, lyr) {
          if (layer.tooltip) {
            var content = document.createElement("div");
            layer.tooltip.fields.forEach(function (field, i) {
              var row = document.createElement("div");
              var alias = document.createElement("b");
              alias.textContent = layer.tooltip.aliases[i];
              var value = feature.properties[field];
              row.appendChild(alias);
              row.appendChild(document.createTextNode(" " + (value == null ? "" : String(value))));
              content.appendChild(row);
            });
            lyr.bindTooltip(content, { sticky: false });
          }
          if (layer.highlight) {
            lyr.on("mouseover", function () { lyr.setStyle(layer.highlight); });
            lyr.on("mouseout", function () { lyr.setStyle(layer.style); });
          }
        }
      });
    } else {
      leafletLayer = layer.clustered
        ? L.markerClusterGroup({ clusterPane: pane })
        : L.layerGroup([], { pane: pane });
      var icon = L.AwesomeMarkers.icon({ icon: layer.icon.icon, markerColor: layer.icon.color, prefix: "fa" });
      layer.markers.forEach(function (m) {
        var popup = document.createElement("span");
        popup.textContent = m.label;
        L.marker([m.lat, m.lon], { icon: icon, pane: pane }).bindPopup(popup).addTo(leafletLayer);
      });
    }

    if (layer.visible) {
      leafletLayer.addTo(map);
    }
    var toggle = spec.toggles.find(function (t) { return t.layer_id === layer.id; });
    if (toggle) {
      overlays[toggle.label] = leafletLayer;
    }
  });

  L.control.layers(null, overlays, { collapsed: spec.collapse_layer_control }).addTo(map);

  var legend = L.control({ position: "bottomright" });
  legend.onAdd = function () {
    var div = L.DomUtil.create("div", "map-legend");
    var title = document.createElement("b");
    title.textContent = spec.legend.title;
    div.appendChild(title);
    spec.legend.entries.forEach(function (entry) {
      var row = document.createElement("div");
      var swatch = document.createElement("span");
      swatch.className = "swatch";
      swatch.style.background = entry.color;
      row.appendChild(swatch);
      row.appendChild(document.createTextNode(entry.label));
      div.appendChild(row);
    });
    return div;
  };
  legend.addTo(map);

  map.fitBounds(spec.viewport);
})();
</script>
</body>
</html>
"#;

/// Render the HTML document for a spec.
pub fn render_document(spec: &RenderSpec) -> AtlasResult<String> {
    let json = serde_json::to_string(spec).map_err(|e| AtlasError::WriteFailure {
        path: "<render spec>".to_string(),
        message: e.to_string(),
    })?;

    let generated = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    Ok(TEMPLATE
        .replace("__LEAFLET__", LEAFLET_VERSION)
        .replace("__CLUSTER__", MARKERCLUSTER_VERSION)
        .replace("__AWESOME__", AWESOME_MARKERS_VERSION)
        .replace("__FA__", FONT_AWESOME_VERSION)
        .replace("__GENERATED__", &generated)
        .replace("__TITLE__", &escape_html(&spec.title))
        .replace("__SPEC__", &escape_script(&json)))
}

/// Write `html` to `path` through a temporary file in the same directory.
///
/// The destination only ever holds a complete document.
pub fn write_document(path: &Path, html: &str) -> AtlasResult<()> {
    let write_failure = |message: String| AtlasError::WriteFailure {
        path: path.display().to_string(),
        message,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_failure(e.to_string()))?;
    tmp.write_all(html.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| write_failure(e.to_string()))?;
    tmp.persist(path).map_err(|e| write_failure(e.error.to_string()))?;

    debug!(path = %path.display(), bytes = html.len(), "Wrote document");
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Keep embedded JSON from closing its script element.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("Jundiaí <2023> & \"parques\""), "Jundiaí &lt;2023&gt; &amp; &quot;parques&quot;");
    }

    #[test]
    fn test_escape_script() {
        let escaped = escape_script(r#"{"label":"</script><b>"}"#);
        assert!(!escaped.contains("</script>"));
        let back: serde_json::Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(back["label"], "</script><b>");
    }

    #[test]
    fn test_feature_text_is_never_parsed_as_markup() {
        assert!(!TEMPLATE.contains("innerHTML"));
        assert!(!TEMPLATE.contains("bindPopup(m.label)"));
        assert!(TEMPLATE.contains("popup.textContent = m.label"));
        assert!(TEMPLATE.contains("alias.textContent = layer.tooltip.aliases[i]"));
        assert!(TEMPLATE.contains("{ sticky: false }"));
        assert!(!TEMPLATE.contains("sticky: true"));
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "old").unwrap();

        write_document(&path, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("index.html");
        let err = write_document(&path, "<html></html>").unwrap_err();
        assert!(matches!(err, AtlasError::WriteFailure { .. }));
        assert!(!path.exists());
    }
}
