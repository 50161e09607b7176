use crate::domain::model::Degradation;
use crate::utils::error::{DegradationError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Reads the degradations out of a `downGradeInfo` response.
///
/// The document's root is expected to wrap one container element whose
/// direct children each describe a lost feature through their `name` and
/// `severity` attributes:
///
/// ```xml
/// <tsResponse>
///   <downgradeInfo>
///     <degradation name="Set Actions" severity="Red"/>
///   </downgradeInfo>
/// </tsResponse>
/// ```
///
/// Only the first child of the root is read, but the whole document must be
/// well formed: unclosed elements, a second root or text outside the root
/// are rejected.
pub fn parse_degradations(xml: &str) -> Result<Vec<Degradation>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut degradations = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut saw_container = false;
    let mut in_container = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 0 && saw_root {
                    return Err(malformed("degradation response has more than one root element"));
                }
                depth += 1;
                match depth {
                    1 => saw_root = true,
                    2 if !saw_container => {
                        saw_container = true;
                        in_container = true;
                    }
                    3 if in_container => degradations.push(read_degradation(&e)?),
                    _ => {}
                }
            }
            Event::Empty(e) => match depth {
                0 if saw_root => {
                    return Err(malformed("degradation response has more than one root element"));
                }
                0 => saw_root = true,
                // 空的 container，沒有任何 degradation
                1 if !saw_container => saw_container = true,
                2 if in_container => degradations.push(read_degradation(&e)?),
                _ => {}
            },
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 1 {
                    in_container = false;
                }
            }
            Event::Text(_) | Event::CData(_) if depth == 0 => {
                return Err(malformed("degradation response has text outside the root element"));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        return Err(malformed("degradation response is truncated"));
    }
    if !saw_root {
        return Err(malformed("degradation response has no root element"));
    }
    if !saw_container {
        return Err(malformed("degradation response root has no child element"));
    }

    Ok(degradations)
}

fn malformed(message: &str) -> DegradationError {
    DegradationError::MalformedResponse {
        message: message.to_string(),
    }
}

fn read_degradation(element: &BytesStart<'_>) -> Result<Degradation> {
    let mut degradation = Degradation {
        name: None,
        severity: None,
    };

    for attr in element.attributes() {
        let attr = attr?;
        match attr.key.local_name().as_ref() {
            b"name" => degradation.name = Some(attr.unescape_value()?.into_owned()),
            b"severity" => degradation.severity = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    Ok(degradation)
}
