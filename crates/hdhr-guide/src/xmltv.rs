//! XMLTV serialization.

use std::borrow::Cow;
use std::io::Write;

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::document::{ChannelElement, GuideDocument, Novelty, ProgrammeElement};

/// `generator-info-name` written on the root element.
const GENERATOR_NAME: &str = "hdhr2iptv";

/// Language tag for title, sub-title and category.
const LANG: &str = "en";

/// Characters allowed by the XML 1.0 `Char` production.
const fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Drops characters that cannot appear in an XML 1.0 document.
fn xml_clean(value: &str) -> Cow<'_, str> {
    if value.chars().all(is_xml_char) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

/// Writes `<name attrs..>text</name>`.
fn text_element<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    for (key, value) in attrs {
        start.push_attribute((*key, xml_clean(value).as_ref()));
    }
    w.write_event(Event::Start(start))?;
    w.write_event(Event::Text(BytesText::new(&xml_clean(text))))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Writes `<name attrs../>`.
fn empty_element<W: Write>(w: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut start = BytesStart::new(name);
    for (key, value) in attrs {
        start.push_attribute((*key, xml_clean(value).as_ref()));
    }
    w.write_event(Event::Empty(start))?;
    Ok(())
}

fn write_channel<W: Write>(w: &mut Writer<W>, channel: &ChannelElement) -> Result<()> {
    let mut start = BytesStart::new("channel");
    start.push_attribute(("id", xml_clean(&channel.id).as_ref()));
    w.write_event(Event::Start(start))?;

    for name in &channel.display_names {
        text_element(w, "display-name", &[], name)?;
    }
    if let Some(icon) = &channel.icon {
        empty_element(w, "icon", &[("src", icon)])?;
    }

    w.write_event(Event::End(BytesEnd::new("channel")))?;
    Ok(())
}

fn write_programme<W: Write>(w: &mut Writer<W>, programme: &ProgrammeElement) -> Result<()> {
    let mut start = BytesStart::new("programme");
    start.push_attribute(("channel", xml_clean(&programme.channel).as_ref()));
    start.push_attribute(("start", xml_clean(&programme.start).as_ref()));
    start.push_attribute(("stop", xml_clean(&programme.stop).as_ref()));
    w.write_event(Event::Start(start))?;

    text_element(w, "title", &[("lang", LANG)], &programme.title)?;
    if let Some(sub_title) = &programme.sub_title {
        text_element(w, "sub-title", &[("lang", LANG)], sub_title)?;
    }
    if let Some(desc) = &programme.desc {
        text_element(w, "desc", &[], desc)?;
    }
    empty_element(w, "credits", &[])?;
    for num in &programme.episode_nums {
        text_element(w, "episode-num", &[("system", num.system)], &num.value)?;
    }
    if let Some(icon) = &programme.icon {
        empty_element(w, "icon", &[("src", icon)])?;
    }

    w.write_event(Event::Start(BytesStart::new("audio")))?;
    text_element(w, "stereo", &[], "stereo")?;
    w.write_event(Event::End(BytesEnd::new("audio")))?;
    empty_element(w, "subtitles", &[("type", "teletext")])?;

    for category in &programme.categories {
        text_element(w, "category", &[("lang", LANG)], category)?;
    }

    match programme.novelty {
        Some(Novelty::New) => empty_element(w, "new", &[])?,
        Some(Novelty::PreviouslyShown) => {
            empty_element(w, "previously-shown", &[])?;
            empty_element(w, "previously-aired", &[])?;
        }
        None => {}
    }

    w.write_event(Event::End(BytesEnd::new("programme")))?;
    Ok(())
}

/// Serializes the document as indented UTF-8 XMLTV.
///
/// Output is byte-identical for equal documents.
///
/// # Errors
///
/// Returns an error if the XML writer fails.
pub fn to_xml(doc: &GuideDocument) -> Result<Vec<u8>> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);

    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut tv = BytesStart::new("tv");
    tv.push_attribute(("generator-info-name", GENERATOR_NAME));
    w.write_event(Event::Start(tv))?;

    for channel in &doc.channels {
        write_channel(&mut w, channel)?;
    }
    for programme in &doc.programmes {
        write_programme(&mut w, programme)?;
    }

    w.write_event(Event::End(BytesEnd::new("tv")))?;

    let mut bytes = w.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}
