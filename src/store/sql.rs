use crate::types::ColumnSchema;

/// Quote an identifier for PostgreSQL, doubling any embedded quotes.
/// Tolerates keyword collisions and the characters normalization leaves
/// behind.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// CREATE TABLE IF NOT EXISTS statement for an inferred schema.
pub fn create_table_statement(table: &str, schema: &ColumnSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.sql_type.sql_name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        columns
    )
}

/// Multi-row parameterized INSERT statement with `$n` placeholders,
/// `row_count` tuples of `columns.len()` parameters each.
pub fn insert_statement(table: &str, columns: &[String], row_count: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut placeholder = 1usize;
    let tuples = (0..row_count)
        .map(|_| {
            let tuple = (0..columns.len())
                .map(|_| {
                    let p = format!("${}", placeholder);
                    placeholder += 1;
                    p
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", tuple)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list,
        tuples
    )
}
