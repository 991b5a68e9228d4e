use crate::errors::ConvertResult;

/// Receives OFX parse events in document order.
///
/// Every hook may fail; the first error stops the event source.
pub trait OfxHandler {
    fn on_header(&mut self, name: &str, value: &str) -> ConvertResult<()>;

    /// A leaf element and its (trimmed, entity-decoded) text value.
    fn on_element(&mut self, name: &str, value: &str) -> ConvertResult<()>;

    fn start_aggregate(&mut self, name: &str) -> ConvertResult<()>;

    fn end_aggregate(&mut self, name: &str) -> ConvertResult<()>;

    /// Names the handler always wants as aggregates, even when they have no
    /// children (`<STMTTRN></STMTTRN>`), where the markup alone would read
    /// them as empty leaves.
    fn is_aggregate(&self, _name: &str) -> bool {
        false
    }
}

/// A source of OFX events: splits raw content into header, element and
/// aggregate-boundary callbacks.
pub trait Parser {
    fn parse<H: OfxHandler>(content: &str, handler: &mut H) -> ConvertResult<()>;

    fn is_supported(filename: Option<&str>, content: &str) -> bool;
}
