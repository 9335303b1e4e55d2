/*!
 * PDF document layer.
 *
 * - `document`: loading, page access and saving
 * - `text_page`: the read model (blocks → lines → spans with bounding boxes)
 * - `canvas`: the write model (redactions and inserted text)
 * - `forms`: Form XObjects painted by a page
 * - `interpreter`, `fonts`, `encoding`, `geometry`: content stream support
 */

pub mod canvas;
pub mod document;
pub mod encoding;
pub mod fonts;
pub mod forms;
pub mod geometry;
pub mod interpreter;
pub mod text_page;

pub use canvas::PageCanvas;
pub use document::PdfDocument;
pub use geometry::{PageFrame, Point, Rect};
pub use text_page::{TextBlock, TextLine, TextPage, TextSpan};
