//! Package manifest (`.nuspec`) reading and rewriting
//!
//! Every package archive carries exactly one manifest at its root. It is an
//! XML document of the form:
//!
//! ```xml
//! <package xmlns="http://schemas.microsoft.com/packaging/2011/08/nuspec.xsd">
//!   <metadata>
//!     <id>App</id>
//!     <version>1.0</version>
//!     <releaseNotes>Fixed things</releaseNotes>
//!     <dependencies>
//!       <dependency id="Shared" version="1.0" />
//!       <group targetFramework="net45">
//!         <dependency id="Lib" version="[1.0,2.0)" />
//!       </group>
//!     </dependencies>
//!     <frameworkAssemblies>
//!       <frameworkAssembly assemblyName="System.Xml" targetFramework="net45" />
//!     </frameworkAssemblies>
//!   </metadata>
//! </package>
//! ```
//!
//! Element names are matched on their local name, case-insensitively.
//! Rewrites stream the document event by event, so everything they don't
//! touch (declaration, namespaces, comments, whitespace) is kept as-is.

use crate::version::{parse_version, VersionRange};
use crate::{Error, Result, TargetPlatform};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use semver::Version;

/// A declared requirement on another package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub id: String,
    /// `None` accepts any version
    pub range: Option<VersionRange>,
    /// `None` applies to every platform
    pub platform: Option<TargetPlatform>,
}

/// The fields of a package manifest this crate works with
#[derive(Debug, Clone)]
pub struct Manifest {
    pub id: String,
    pub version: Version,
    pub release_notes: Option<String>,
    pub dependencies: Vec<Dependency>,
    /// `targetFramework` values of `frameworkAssembly` entries
    pub framework_assemblies: Vec<TargetPlatform>,
}

impl Manifest {
    /// Parse manifest XML
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(strip_bom(xml));

        let mut stack: Vec<String> = Vec::new();
        let mut text = String::new();
        let mut group: Option<Option<TargetPlatform>> = None;

        let mut id = None;
        let mut version = None;
        let mut release_notes = None;
        let mut dependencies = Vec::new();
        let mut framework_assemblies = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = local_name(&e);
                    handle_element(
                        &e,
                        &name,
                        &stack,
                        &mut group,
                        &mut dependencies,
                        &mut framework_assemblies,
                    )?;
                    stack.push(name);
                    text.clear();
                }
                Event::Empty(e) => {
                    let name = local_name(&e);
                    handle_element(
                        &e,
                        &name,
                        &stack,
                        &mut group,
                        &mut dependencies,
                        &mut framework_assemblies,
                    )?;
                    // <group/> declares nothing
                    if name == "group" {
                        group = None;
                    }
                    if in_metadata(&stack) && name == "releasenotes" {
                        release_notes = Some(String::new());
                    }
                }
                Event::Text(e) => text.push_str(&e.unescape()?),
                Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
                Event::End(_) => {
                    let Some(name) = stack.pop() else {
                        return Err(Error::InvalidManifest("Unbalanced closing tag".to_string()));
                    };
                    if in_metadata(&stack) {
                        match name.as_str() {
                            "id" => id = Some(text.trim().to_string()),
                            "version" => version = Some(text.trim().to_string()),
                            "releasenotes" => release_notes = Some(text.clone()),
                            _ => {}
                        }
                    }
                    if name == "group" {
                        group = None;
                    }
                    text.clear();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let id = id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidManifest("Manifest has no <id>".to_string()))?;
        let version = version
            .ok_or_else(|| Error::InvalidManifest(format!("Manifest for {} has no <version>", id)))?;
        let version = parse_version(&version)?;

        Ok(Self {
            id,
            version,
            release_notes,
            dependencies,
            framework_assemblies,
        })
    }

    /// Dependencies that apply to `target`: unscoped ones and ones scoped to it exactly
    pub fn dependencies_for<'a>(
        &'a self,
        target: &'a TargetPlatform,
    ) -> impl Iterator<Item = &'a Dependency> + 'a {
        self.dependencies
            .iter()
            .filter(move |d| d.platform.as_ref().map_or(true, |p| p == target))
    }
}

fn handle_element(
    e: &BytesStart<'_>,
    name: &str,
    stack: &[String],
    group: &mut Option<Option<TargetPlatform>>,
    dependencies: &mut Vec<Dependency>,
    framework_assemblies: &mut Vec<TargetPlatform>,
) -> Result<()> {
    let parent = stack.last().map(String::as_str);

    match (parent, name) {
        (Some("dependencies"), "group") => {
            let platform = attribute(e, "targetFramework")?
                .filter(|s| !s.trim().is_empty())
                .map(|s| TargetPlatform::from_declaration(&s));
            *group = Some(platform);
        }
        (Some("dependencies") | Some("group"), "dependency") => {
            let id = attribute(e, "id")?
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| Error::InvalidManifest("<dependency> without an id".to_string()))?;
            let range = attribute(e, "version")?
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<VersionRange>())
                .transpose()?;
            let platform = if parent == Some("group") {
                group.clone().flatten()
            } else {
                None
            };
            dependencies.push(Dependency {
                id: id.trim().to_string(),
                range,
                platform,
            });
        }
        (Some("frameworkassemblies"), "frameworkassembly") => {
            if let Some(value) = attribute(e, "targetFramework")? {
                framework_assemblies.extend(parse_framework_list(&value));
            }
        }
        _ => {}
    }

    Ok(())
}

/// A `targetFramework` attribute holds either one full name or a comma-separated list of short names
fn parse_framework_list(value: &str) -> Vec<TargetPlatform> {
    if value.contains('=') {
        return vec![TargetPlatform::from_declaration(value)];
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(TargetPlatform::from_declaration)
        .collect()
}

fn in_metadata(stack: &[String]) -> bool {
    stack.len() == 2 && stack[1] == "metadata"
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref().eq_ignore_ascii_case(name.as_bytes()) {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn strip_bom(xml: &str) -> &str {
    xml.strip_prefix('\u{feff}').unwrap_or(xml)
}

/// Remove the `dependencies` element from the manifest's metadata
///
/// Release packages carry their dependencies' files and must not declare
/// them again. A manifest without the element is returned unchanged.
pub fn remove_dependencies(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(strip_bom(xml));
    let mut writer = Writer::new(Vec::new());
    let mut stack: Vec<String> = Vec::new();
    let mut skipping = 0usize;

    loop {
        let event = reader.read_event()?;
        if skipping > 0 {
            match event {
                Event::Start(_) => skipping += 1,
                Event::End(_) => skipping -= 1,
                Event::Eof => {
                    return Err(Error::InvalidManifest(
                        "Unterminated <dependencies> element".to_string(),
                    ))
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => {
                let name = local_name(&e);
                if name == "dependencies" && stack.last().map(String::as_str) == Some("metadata") {
                    skipping = 1;
                    continue;
                }
                stack.push(name);
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if local_name(&e) == "dependencies"
                    && stack.last().map(String::as_str) == Some("metadata")
                {
                    continue;
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                stack.pop();
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    into_string(writer)
}

/// Replace the text of `releaseNotes` with `render(current_text)`
///
/// The rendered text is written as CDATA so markup produced by the renderer
/// (HTML, for instance) stays literal text for XML readers. Returns `None`
/// when the manifest has no release notes.
pub fn render_release_notes<F>(xml: &str, render: F) -> Result<Option<String>>
where
    F: Fn(&str) -> String,
{
    let mut reader = Reader::from_str(strip_bom(xml));
    let mut writer = Writer::new(Vec::new());
    let mut stack: Vec<String> = Vec::new();
    let mut found = false;
    // Open releaseNotes element, its collected text and nesting depth
    let mut notes: Option<(BytesStart<'_>, String)> = None;
    let mut notes_depth = 0usize;

    loop {
        let event = reader.read_event()?;

        if notes.is_some() {
            match event {
                Event::Text(e) => {
                    if let Some((_, text)) = notes.as_mut() {
                        text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let Some((_, text)) = notes.as_mut() {
                        text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                // Markup inside release notes is flattened to its text
                Event::Start(_) => notes_depth += 1,
                Event::End(_) if notes_depth > 0 => notes_depth -= 1,
                Event::End(_) => {
                    if let Some((start, text)) = notes.take() {
                        write_notes(&mut writer, start, &render(&text))?;
                    }
                }
                Event::Eof => {
                    return Err(Error::InvalidManifest(
                        "Unterminated <releaseNotes> element".to_string(),
                    ))
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => {
                let name = local_name(&e);
                if !found && name == "releasenotes" && in_metadata(&stack) {
                    found = true;
                    notes = Some((e, String::new()));
                    continue;
                }
                stack.push(name);
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                if !found && local_name(&e) == "releasenotes" && in_metadata(&stack) {
                    found = true;
                    write_notes(&mut writer, e, &render(""))?;
                    continue;
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                stack.pop();
                writer.write_event(Event::End(e))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    if !found {
        return Ok(None);
    }
    into_string(writer).map(Some)
}

fn write_notes(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>, rendered: &str) -> Result<()> {
    let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    writer.write_event(Event::Start(start))?;

    // "]]>" cannot appear inside one CDATA section; split it across two
    let mut rest = rendered;
    while let Some(idx) = rest.find("]]>") {
        writer.write_event(Event::CData(BytesCData::new(&rest[..idx + 2])))?;
        rest = &rest[idx + 2..];
    }
    writer.write_event(Event::CData(BytesCData::new(rest)))?;

    writer.write_event(Event::End(end))?;
    Ok(())
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::InvalidManifest(format!("Rewritten manifest is not UTF-8: {}", e)))
}
