use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};

use super::{DocumentKind, ExtractError};

thread_local! {
    static PARSER_PANIC_CONTAINED: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is inside a parser call whose panic will be
/// caught and reported as a parse failure. Panic hooks use this to stay quiet.
pub fn parser_panic_contained() -> bool {
    PARSER_PANIC_CONTAINED.with(Cell::get)
}

/// Clears the flag on scope exit, including during unwinding
struct ContainGuard {
    previous: bool,
}

impl ContainGuard {
    fn enter() -> Self {
        Self {
            previous: PARSER_PANIC_CONTAINED.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for ContainGuard {
    fn drop(&mut self) {
        PARSER_PANIC_CONTAINED.with(|flag| flag.set(self.previous));
    }
}

/// Run `f`, turning a panic into its message
fn contain_panic<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    let _guard = ContainGuard::enter();
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

/// Extract page text from an in-memory PDF, one newline after each page.
///
/// `pdf-extract` can panic on malformed input, so the call is isolated and a
/// panic is reported as a parse failure.
pub fn extract_pdf_text(pdf_bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = contain_panic(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes))
        .map_err(|message| ExtractError::parse(DocumentKind::Pdf, message))?
        .map_err(|e| ExtractError::parse(DocumentKind::Pdf, e.to_string()))?;

    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push('\n');
    }
    Ok(text)
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("parser panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("parser panicked: {}", s)
    } else {
        "parser panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a PDF with one page per entry using lopdf
    fn make_test_pdf(pages: &[&str]) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let pages_id = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::new();

        for text in pages {
            let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_extracts_text_from_digital_pdf() {
        let bytes = make_test_pdf(&["Hello World from the refiner"]);
        let text = extract_pdf_text(&bytes).unwrap();
        assert!(
            text.contains("Hello") || text.contains("World"),
            "unexpected text: {text}"
        );
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_every_page_ends_with_newline() {
        let bytes = make_test_pdf(&["First", "Second"]);
        let text = extract_pdf_text(&bytes).unwrap();
        assert!(text.matches('\n').count() >= 2, "unexpected text: {text:?}");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_garbage_bytes_are_a_parse_error() {
        let inputs: [&[u8]; 3] = [b"not a pdf", b"", &[0xff; 64]];
        for input in inputs {
            let err = extract_pdf_text(input).unwrap_err();
            assert!(matches!(
                err,
                ExtractError::Parse {
                    kind: DocumentKind::Pdf,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_contained_panic_becomes_message() {
        assert!(!parser_panic_contained());

        let inside = contain_panic(parser_panic_contained).unwrap();
        assert!(inside);

        let err = contain_panic(|| -> u32 { panic!("bad xref table") }).unwrap_err();
        assert_eq!(err, "parser panicked: bad xref table");
        assert!(!parser_panic_contained());
    }
}
