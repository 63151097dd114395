//! Launch page discovery for SCORM packages.
//!
//! The package descriptor (`imsmanifest.xml`) names the entry point of each
//! resource. When there is no usable manifest we fall back to the file names
//! authoring tools conventionally emit.

use std::path::{Component, Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, LocalizerError};

pub const MANIFEST_NAME: &str = "imsmanifest.xml";

/// Launch page names tried, in any folder, when the manifest gives nothing
pub const LAUNCH_CANDIDATES: [&str; 5] = [
    "index_lms.html",
    "index.html",
    "story.html",
    "launch.html",
    "player.html",
];

/// One `<resource>` element of a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestResource {
    pub identifier: Option<String>,
    pub scorm_type: Option<String>,
    pub href: Option<String>,
    /// Combined `xml:base` of the manifest, resources and resource elements
    pub base: Option<String>,
    /// `href` of nested `<file>` elements, in document order
    pub files: Vec<String>,
}

#[derive(Default)]
struct Attributes {
    identifier: Option<String>,
    scorm_type: Option<String>,
    href: Option<String>,
    base: Option<String>,
}

/// Locate the package descriptor, preferring the shallowest match
pub fn find_manifest(root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(MANIFEST_NAME))
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path())
}

/// Parse the resources out of a manifest document.
///
/// Element and attribute names are matched on their local part, so both
/// namespaced (`<imscp:resource>`) and plain manifests work.
pub fn parse_manifest(xml: &str) -> Result<Vec<ManifestResource>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut resources = Vec::new();
    let mut manifest_base: Option<String> = None;
    let mut resources_base: Option<String> = None;
    let mut current: Option<ManifestResource> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(LocalizerError::Manifest(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        };

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"manifest" => manifest_base = read_attributes(&e)?.base,
                b"resources" => resources_base = read_attributes(&e)?.base,
                b"resource" => {
                    let attrs = read_attributes(&e)?;
                    let base = join_bases(&[&manifest_base, &resources_base, &attrs.base]);
                    current = Some(new_resource(attrs, base));
                }
                b"file" => push_file(&e, &mut current)?,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"resource" => {
                    let attrs = read_attributes(&e)?;
                    let base = join_bases(&[&manifest_base, &resources_base, &attrs.base]);
                    resources.push(new_resource(attrs, base));
                }
                b"file" => push_file(&e, &mut current)?,
                _ => {}
            },
            Event::End(e) => {
                if e.local_name().as_ref() == b"resource" {
                    if let Some(resource) = current.take() {
                        resources.push(resource);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(resources)
}

/// Launch page named by the package manifest, if any resolves to an existing
/// file inside `root`
pub fn launch_from_manifest(root: &Path) -> Option<PathBuf> {
    let manifest_path = match find_manifest(root) {
        Some(path) => path,
        None => {
            warn!("No {} found in {}", MANIFEST_NAME, root.display());
            return None;
        }
    };

    let xml = match std::fs::read_to_string(&manifest_path) {
        Ok(xml) => xml,
        Err(e) => {
            warn!("Failed to read {}: {}", manifest_path.display(), e);
            return None;
        }
    };

    let resources = match parse_manifest(&xml) {
        Ok(resources) => resources,
        Err(e) => {
            warn!("Error parsing {}: {}", manifest_path.display(), e);
            return None;
        }
    };

    let manifest_dir = manifest_path.parent().unwrap_or(root);
    for resource in &resources {
        let base = resource.base.as_deref().unwrap_or("");

        if let Some(href) = &resource.href {
            if let Some(path) = resolve_href(root, manifest_dir, base, href) {
                info!("Launch file found via manifest: {}", path.display());
                return Some(path);
            }
        }

        // Some packages only list the entry page as a nested <file>
        for href in resource.files.iter().filter(|h| is_html(h)) {
            if let Some(path) = resolve_href(root, manifest_dir, base, href) {
                info!("Launch file found via <file>: {}", path.display());
                return Some(path);
            }
        }
    }

    warn!("No valid href found in manifest resources of {}", manifest_path.display());
    None
}

/// Shallowest file named like a conventional launch page
pub fn fallback_launch_file(root: &Path) -> Option<PathBuf> {
    let found = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_lowercase();
            LAUNCH_CANDIDATES.contains(&name.as_str())
        })
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path());

    if let Some(path) = &found {
        info!("Launch file found via fallback: {}", path.display());
    }
    found
}

/// Manifest first, then the filename heuristic
pub fn resolve_launch_file(root: &Path) -> Option<PathBuf> {
    launch_from_manifest(root).or_else(|| fallback_launch_file(root))
}

fn new_resource(attrs: Attributes, base: Option<String>) -> ManifestResource {
    ManifestResource {
        identifier: attrs.identifier,
        scorm_type: attrs.scorm_type,
        href: attrs.href,
        base,
        files: Vec::new(),
    }
}

fn push_file(element: &BytesStart, current: &mut Option<ManifestResource>) -> Result<()> {
    if let Some(resource) = current.as_mut() {
        if let Some(href) = read_attributes(element)?.href {
            resource.files.push(href);
        }
    }
    Ok(())
}

fn read_attributes(element: &BytesStart) -> Result<Attributes> {
    let mut attrs = Attributes::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| LocalizerError::Manifest(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| LocalizerError::Manifest(e.to_string()))?
            .trim()
            .to_string();
        let key = attr.key.local_name();
        let key = String::from_utf8_lossy(key.as_ref()).to_lowercase();

        match key.as_str() {
            "identifier" => attrs.identifier = Some(value),
            "scormtype" => attrs.scorm_type = Some(value),
            "href" if !value.is_empty() => attrs.href = Some(value),
            "base" if !value.is_empty() => attrs.base = Some(value),
            _ => {}
        }
    }
    Ok(attrs)
}

fn join_bases(bases: &[&Option<String>]) -> Option<String> {
    let parts: Vec<&str> = bases
        .iter()
        .filter_map(|b| b.as_deref())
        .map(|b| b.trim_matches('/'))
        .filter(|b| !b.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Resolve an href against the manifest folder. Query strings and fragments
/// are dropped; results outside `root` or that do not exist are rejected.
fn resolve_href(root: &Path, manifest_dir: &Path, base: &str, href: &str) -> Option<PathBuf> {
    let href = href.split(['?', '#']).next().unwrap_or("").trim();
    if href.is_empty() || href.contains("://") {
        return None;
    }

    let joined = manifest_dir.join(base).join(href);
    let normalized = normalize(&joined)?;
    let normalized_root = normalize(root)?;
    if !normalized.starts_with(&normalized_root) {
        debug!("Ignoring href outside package: {}", href);
        return None;
    }

    normalized.is_file().then_some(normalized)
}

/// Lexically fold `.` and `..` components; None if `..` climbs past the start
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

fn is_html(href: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or("").to_lowercase();
    path.ends_with(".html") || path.ends_with(".htm")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    const NAMESPACED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="course" xmlns="http://www.imsglobal.org/xsd/imscp_v1p1"
          xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3">
  <organizations default="org">
    <organization identifier="org"><title>Course</title></organization>
  </organizations>
  <resources>
    <resource identifier="shared" type="webcontent" adlcp:scormType="asset">
      <file href="shared/player.js"/>
    </resource>
    <resource identifier="sco" type="webcontent" adlcp:scormType="sco" href="index_lms.html?lang=en">
      <file href="index_lms.html"/>
      <file href="story.html"/>
    </resource>
  </resources>
</manifest>"#;

    #[test]
    fn parses_namespaced_resources() {
        let resources = parse_manifest(NAMESPACED).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].identifier.as_deref(), Some("shared"));
        assert_eq!(resources[0].href, None);
        assert_eq!(resources[0].files, vec!["shared/player.js"]);
        assert_eq!(resources[1].scorm_type.as_deref(), Some("sco"));
        assert_eq!(resources[1].href.as_deref(), Some("index_lms.html?lang=en"));
        assert_eq!(resources[1].files.len(), 2);
    }

    #[test]
    fn combines_xml_base_attributes() {
        let xml = r#"<manifest xml:base="content/">
            <resources xml:base="course">
              <resource identifier="r1" href="start.html" xml:base="/module1/"/>
            </resources>
          </manifest>"#;
        let resources = parse_manifest(xml).unwrap();
        assert_eq!(resources[0].base.as_deref(), Some("content/course/module1"));
        assert_eq!(resources[0].href.as_deref(), Some("start.html"));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(matches!(
            parse_manifest("<manifest><resources></manifest>"),
            Err(LocalizerError::Manifest(_))
        ));
    }

    #[test]
    fn launch_from_nested_manifest() {
        let dir = TempDir::new().unwrap();
        dir.child("pkg/imsmanifest.xml").write_str(NAMESPACED).unwrap();
        dir.child("pkg/index_lms.html").write_str("<html/>").unwrap();

        let launch = launch_from_manifest(dir.path()).unwrap();
        assert!(launch.ends_with("pkg/index_lms.html"));
    }

    #[test]
    fn launch_from_nested_file_element() {
        let dir = TempDir::new().unwrap();
        dir.child("imsmanifest.xml")
            .write_str(
                r#"<manifest><resources><resource identifier="r">
                     <file href="lib/app.js"/><file href="course/start.htm"/>
                   </resource></resources></manifest>"#,
            )
            .unwrap();
        dir.child("lib/app.js").write_str("").unwrap();
        dir.child("course/start.htm").write_str("").unwrap();

        let launch = launch_from_manifest(dir.path()).unwrap();
        assert!(launch.ends_with("course/start.htm"));
    }

    #[test]
    fn href_escaping_package_is_rejected() {
        let outer = TempDir::new().unwrap();
        outer.child("secret.html").write_str("").unwrap();
        outer
            .child("pkg/imsmanifest.xml")
            .write_str(r#"<manifest><resources><resource href="../secret.html"/></resources></manifest>"#)
            .unwrap();

        assert_eq!(launch_from_manifest(&outer.path().join("pkg")), None);
    }

    #[test]
    fn fallback_prefers_shallowest_candidate() {
        let dir = TempDir::new().unwrap();
        dir.child("a/b/index.html").write_str("").unwrap();
        dir.child("story.html").write_str("").unwrap();

        let launch = fallback_launch_file(dir.path()).unwrap();
        assert_eq!(launch, dir.path().join("story.html"));
    }

    #[test]
    fn resolve_uses_fallback_when_manifest_has_no_valid_href() {
        let dir = TempDir::new().unwrap();
        dir.child("imsmanifest.xml")
            .write_str(r#"<manifest><resources><resource href="missing.html"/></resources></manifest>"#)
            .unwrap();
        dir.child("Player.HTML").write_str("").unwrap();

        let launch = resolve_launch_file(dir.path()).unwrap();
        assert!(launch.ends_with("Player.HTML"));
    }

    #[test]
    fn nothing_found() {
        let dir = TempDir::new().unwrap();
        dir.child("readme.txt").write_str("").unwrap();
        assert_eq!(resolve_launch_file(dir.path()), None);
    }
}
