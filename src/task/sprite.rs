//! Icon sprite task: stack every matched SVG into one sprite sheet.
//!
//! Each icon becomes a nested `<svg id="...">` keyed by its file stem, and a
//! style rule hides everything but the targeted icon, so pages reference
//! icons as `sprite.svg#name`. The sheet lands one level above the images
//! destination.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use super::{TaskError, TaskOutcome, log_empty, matched_sources, write_output};
use crate::log;
use crate::paths::{PathMapping, SPRITE_FILE_NAME};
use crate::utils::fmt::plural_count;

/// Hides every stacked icon except the one selected by the URL fragment.
const STACK_STYLE: &str = ":root svg:not(:target){display:none}";

struct Icon {
    id: String,
    view_box: Option<String>,
    inner: String,
}

pub(super) fn run(mapping: &PathMapping) -> Result<TaskOutcome, TaskError> {
    let files = matched_sources(mapping)?;
    if files.is_empty() {
        log_empty(mapping.category);
        return Ok(TaskOutcome::default());
    }

    let mut icons = Vec::with_capacity(files.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for file in &files {
        let icon = extract_icon(file)?;
        if let Some(previous) = seen.get(&icon.id) {
            log!(
                "warning";
                "skipping {}: icon id `{}` already taken by {}",
                file.display(),
                icon.id,
                previous.display()
            );
            continue;
        }
        seen.insert(icon.id.clone(), file.clone());
        icons.push(icon);
    }

    let sprite_path = mapping
        .dest
        .parent()
        .unwrap_or(&mapping.dest)
        .join(SPRITE_FILE_NAME);
    let sheet = assemble(&icons).map_err(|e| TaskError::io(&sprite_path, e))?;
    write_output(&sprite_path, sheet)?;

    log!(
        mapping.category.label();
        "stacked {} into {}", plural_count(icons.len(), "icon"), SPRITE_FILE_NAME
    );
    Ok(TaskOutcome {
        matched: files.len(),
        written: 1,
    })
}

/// Pull the root `<svg>` element apart: its viewBox and its raw content.
fn extract_icon(path: &Path) -> Result<Icon, TaskError> {
    let text = fs::read_to_string(path).map_err(|e| TaskError::io(path, e))?;
    let mut reader = Reader::from_str(&text);
    let id = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) if elem.name().as_ref() == b"svg" => {
                let view_box = view_box_of(&elem, path)?;
                let end = elem.to_end().into_owned();
                let inner = reader
                    .read_text(end.name())
                    .map_err(|e| TaskError::transform(path, e.to_string()))?;
                return Ok(Icon {
                    id,
                    view_box,
                    inner: inner.trim().to_owned(),
                });
            }
            Ok(Event::Empty(elem)) if elem.name().as_ref() == b"svg" => {
                let view_box = view_box_of(&elem, path)?;
                return Ok(Icon {
                    id,
                    view_box,
                    inner: String::new(),
                });
            }
            Ok(Event::Eof) => {
                return Err(TaskError::transform(path, "no <svg> root element"));
            }
            Ok(_) => {}
            Err(e) => return Err(TaskError::transform(path, e.to_string())),
        }
    }
}

fn view_box_of(elem: &BytesStart<'_>, path: &Path) -> Result<Option<String>, TaskError> {
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| TaskError::transform(path, e.to_string()))?;
        if attr.key.as_ref() == b"viewBox" {
            let value = attr
                .unescape_value()
                .map_err(|e| TaskError::transform(path, e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn assemble(icons: &[Icon]) -> std::io::Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    root.push_attribute(("xmlns:xlink", "http://www.w3.org/1999/xlink"));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("style")))?;
    writer.write_event(Event::Text(BytesText::new(STACK_STYLE)))?;
    writer.write_event(Event::End(BytesEnd::new("style")))?;

    for icon in icons {
        let mut elem = BytesStart::new("svg");
        elem.push_attribute(("id", icon.id.as_str()));
        if let Some(view_box) = &icon.view_box {
            elem.push_attribute(("viewBox", view_box.as_str()));
        }
        if icon.inner.is_empty() {
            writer.write_event(Event::Empty(elem))?;
        } else {
            writer.write_event(Event::Start(elem))?;
            // Raw child markup, already escaped in the source icon
            writer.write_event(Event::Text(BytesText::from_escaped(icon.inner.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new("svg")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("svg")))?;
    Ok(writer.into_inner().into_inner())
}
