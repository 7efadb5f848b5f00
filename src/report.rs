//! Failure extraction from JUnit-style XML test reports.
//!
//! The accepted shape is a collection root (normally `<testsuites>`) holding
//! `<testsuite name=..>` elements, each holding `<testcase name=..>`
//! elements. A case is failing when at least one `<failure>` child is
//! present. Everything else in the document is ignored.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One failing test case, identified by its suite and case names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Failure {
    /// Suite name. For Go reports this is the full package path.
    pub suite: String,
    /// Test case name.
    pub case: String,
}

impl Failure {
    /// Creates a failure record.
    pub fn new(suite: impl Into<String>, case: impl Into<String>) -> Self {
        Self { suite: suite.into(), case: case.into() }
    }
}

/// Errors raised when a report cannot be read at all.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report is empty or whitespace.
    #[error("test report is empty")]
    Empty,
    /// The report has text but no root element.
    #[error("test report has no root element")]
    NoRoot,
    /// The XML itself is malformed.
    #[error("malformed test report at byte {position}: {source}")]
    Xml {
        /// Byte offset where the reader stopped.
        position: usize,
        /// Underlying XML error.
        #[source]
        source: quick_xml::Error,
    },
    /// The document ended with elements still open.
    #[error("test report ended with {open} unclosed element(s)")]
    Truncated {
        /// Number of elements left open.
        open: usize,
    },
}

/// Where the reader currently is in the suite → case → failure hierarchy.
#[derive(Debug)]
enum Frame {
    Collection,
    Suite(String),
    Case { suite: String, name: String, failed: bool },
    Other,
}

/// Parses a report into its failing cases, in document order.
///
/// Each failing case appears once no matter how many `<failure>` children
/// it has. Suites and cases without a `name` attribute are skipped along
/// with everything beneath them.
///
/// # Errors
///
/// Returns [`ReportError`] when the document is empty, has no root element,
/// is not well-formed XML, or is truncated.
pub fn parse_report(text: &str) -> Result<Vec<Failure>, ReportError> {
    if text.trim().is_empty() {
        return Err(ReportError::Empty);
    }

    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Frame> = Vec::new();
    let mut failures = Vec::new();
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|source| xml_error(&reader, source))?;
        match event {
            Event::Start(start) => {
                saw_root = true;
                let frame =
                    enter(&mut stack, &start).map_err(|source| xml_error(&reader, source))?;
                stack.push(frame);
            }
            Event::Empty(start) => {
                saw_root = true;
                let frame =
                    enter(&mut stack, &start).map_err(|source| xml_error(&reader, source))?;
                leave(frame, &mut failures);
            }
            Event::End(_) => {
                if let Some(frame) = stack.pop() {
                    leave(frame, &mut failures);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ReportError::NoRoot);
    }
    if !stack.is_empty() {
        return Err(ReportError::Truncated { open: stack.len() });
    }
    Ok(failures)
}

fn xml_error(reader: &Reader<&[u8]>, source: quick_xml::Error) -> ReportError {
    ReportError::Xml { position: reader.buffer_position(), source }
}

/// Classifies a newly opened element and marks its parent case as failed
/// when the element is a `<failure>`.
fn enter(stack: &mut [Frame], start: &BytesStart<'_>) -> Result<Frame, quick_xml::Error> {
    let tag = start.name();
    let tag = tag.as_ref();

    let frame = match stack.last_mut() {
        None if tag == b"testsuite" => suite_frame(start)?,
        None => Frame::Collection,
        Some(Frame::Collection) if tag == b"testsuite" => suite_frame(start)?,
        Some(Frame::Suite(suite)) if tag == b"testcase" => match name_attr(start)? {
            Some(name) => Frame::Case { suite: suite.clone(), name, failed: false },
            None => Frame::Other,
        },
        Some(Frame::Case { failed, .. }) => {
            if tag == b"failure" {
                *failed = true;
            }
            Frame::Other
        }
        Some(_) => Frame::Other,
    };
    Ok(frame)
}

fn suite_frame(start: &BytesStart<'_>) -> Result<Frame, quick_xml::Error> {
    Ok(name_attr(start)?.map_or(Frame::Other, Frame::Suite))
}

fn leave(frame: Frame, failures: &mut Vec<Failure>) {
    if let Frame::Case { suite, name, failed: true } = frame {
        failures.push(Failure { suite, case: name });
    }
}

fn name_attr(start: &BytesStart<'_>) -> Result<Option<String>, quick_xml::Error> {
    let Some(attr) = start.try_get_attribute("name")? else {
        return Ok(None);
    };
    let value = attr.unescape_value()?;
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(value.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_failing_cases_in_document_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="pkg/a" tests="3" failures="2">
    <testcase name="TestOne" classname="a" time="0.01"></testcase>
    <testcase name="TestTwo" classname="a"><failure message="boom">trace</failure></testcase>
    <testcase name="TestThree" classname="a"><failure/></testcase>
  </testsuite>
  <testsuite name="pkg/b">
    <testcase name="TestFour"><failure>x</failure></testcase>
  </testsuite>
</testsuites>"#;

        let failures = parse_report(xml).unwrap();
        assert_eq!(
            failures,
            vec![
                Failure::new("pkg/a", "TestTwo"),
                Failure::new("pkg/a", "TestThree"),
                Failure::new("pkg/b", "TestFour"),
            ]
        );
    }

    #[test]
    fn no_failures_yields_empty() {
        let xml = r#"<testsuites>
  <testsuite name="pkg/a">
    <testcase name="TestOne"/>
    <testcase name="TestTwo"><skipped message="later"/></testcase>
  </testsuite>
</testsuites>"#;
        assert!(parse_report(xml).unwrap().is_empty());
    }

    #[test]
    fn case_with_many_failures_reported_once() {
        let xml = r#"<testsuites><testsuite name="pkg/a">
  <testcase name="TestFlaky">
    <system-out>log</system-out>
    <failure>first</failure>
    <skipped/>
    <failure>second</failure>
  </testcase>
</testsuite></testsuites>"#;
        assert_eq!(parse_report(xml).unwrap(), vec![Failure::new("pkg/a", "TestFlaky")]);
    }

    #[test]
    fn skips_nodes_without_names() {
        let xml = r#"<testsuites>
  <testsuite><testcase name="Orphan"><failure/></testcase></testsuite>
  <testsuite name="pkg/a">
    <testcase><failure/></testcase>
    <testcase name=""><failure/></testcase>
    <testcase name="TestKept"><failure/></testcase>
  </testsuite>
</testsuites>"#;
        assert_eq!(parse_report(xml).unwrap(), vec![Failure::new("pkg/a", "TestKept")]);
    }

    #[test]
    fn ignores_failures_outside_cases() {
        let xml = r#"<testsuites>
  <failure/>
  <testsuite name="pkg/a">
    <failure/>
    <properties><property name="go.version" value="1.22"/></properties>
    <testcase name="TestOk"><error message="not a failure"/></testcase>
  </testsuite>
</testsuites>"#;
        assert!(parse_report(xml).unwrap().is_empty());
    }

    #[test]
    fn accepts_bare_testsuite_root() {
        let xml = r#"<testsuite name="pkg/solo">
  <testcase name="TestX"><failure/></testcase>
</testsuite>"#;
        assert_eq!(parse_report(xml).unwrap(), vec![Failure::new("pkg/solo", "TestX")]);
    }

    #[test]
    fn unescapes_attribute_values() {
        let xml = r#"<testsuites><testsuite name="pkg/a">
  <testcase name="TestMap/a&amp;b"><failure/></testcase>
</testsuite></testsuites>"#;
        assert_eq!(parse_report(xml).unwrap()[0].case, "TestMap/a&b");
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(matches!(parse_report("  \n"), Err(ReportError::Empty)));
    }

    #[test]
    fn mismatched_tags_are_an_error() {
        let xml = "<testsuites><testsuite name=\"a\"></testcase></testsuites>";
        assert!(matches!(parse_report(xml), Err(ReportError::Xml { .. })));
    }

    #[test]
    fn truncated_document_is_an_error() {
        let xml = "<testsuites><testsuite name=\"a\"><testcase name=\"T\">";
        let err = parse_report(xml).unwrap_err();
        assert!(matches!(err, ReportError::Truncated { open: 3 }));
        assert!(err.to_string().contains("3 unclosed"));
    }

    #[test]
    fn text_without_elements_is_an_error() {
        for text in ["502 Bad Gateway", r#"{"error":"timeout"}"#] {
            assert!(matches!(parse_report(text), Err(ReportError::NoRoot)), "{text}");
        }
    }

    #[test]
    fn comment_only_document_is_an_error() {
        assert!(matches!(parse_report("<!-- truncated upload -->"), Err(ReportError::NoRoot)));
    }

    #[test]
    fn declaration_only_document_is_an_error() {
        let err = parse_report("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n").unwrap_err();
        assert!(matches!(err, ReportError::NoRoot));
        assert_eq!(err.to_string(), "test report has no root element");
    }

    #[test]
    fn empty_root_element_has_no_failures() {
        assert!(parse_report("<testsuites/>").unwrap().is_empty());
    }
}
