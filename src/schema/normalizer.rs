/// Normalize a CSV header name into a store-safe column identifier.
///
/// Spaces, hyphens, and periods are each replaced with an underscore.
/// The replacements are applied per character class; the classes are
/// disjoint so the order does not affect the result.
pub fn normalize_column_name(name: &str) -> String {
    name.replace(' ', "_").replace('-', "_").replace('.', "_")
}
