//! Type identifiers.
//!
//! Every payload travels with an `@type` header naming its declared type. The
//! same string is the key under which consumers register handlers, so it has
//! to be identical on both sides of the broker. The default identifier is the
//! type's name without its module path:
//!
//! ```text
//! my_app::events::OrderPlaced              -> OrderPlaced
//! my_app::Envelope<my_app::events::Order>  -> Envelope<Order>
//! ```

/// Header key carrying the type identifier of a record's payload.
pub const MESSAGE_TYPE_HEADER: &str = "@type";

/// Default type identifier for `T`.
///
/// Derived from [`std::any::type_name`] with every module path stripped, so it
/// stays the same when a type moves between modules of the same crate but the
/// declared name does not change.
pub fn type_identifier<T: ?Sized>() -> String {
    strip_module_paths(std::any::type_name::<T>())
}

/// Remove module paths from a fully-qualified Rust type name.
///
/// Path segments are the identifier runs followed by `::`; everything else
/// (generic brackets, separators, reference sigils, array lengths) is kept.
pub fn strip_module_paths(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    // Start (in `out`) of the identifier run currently being copied.
    let mut segment_start = 0;
    let mut chars = full_name.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = out.len();
        }
    }

    out
}
