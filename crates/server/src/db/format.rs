//! Text rendering of table metadata and result sets

/// One result row, every value in text form, NULL as `None`
pub type TextRow = Vec<Option<String>>;

/// Column metadata used for the schema description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
}

/// Table metadata used for the schema description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
}

/// A handful of rows shown beneath a table definition
#[derive(Debug, Clone, Default)]
pub struct SampleRows {
    pub rows: Vec<TextRow>,
}

/// Sample values longer than this are cut
const SAMPLE_CELL_CHARS: usize = 100;

/// Render a table as a `CREATE TABLE` statement, followed by sample rows if given.
pub fn render_table(table: &TableInfo, sample: Option<&SampleRows>) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|col| {
            if col.not_null {
                format!("\t{} {} NOT NULL", col.name, col.data_type)
            } else {
                format!("\t{} {}", col.name, col.data_type)
            }
        })
        .collect();
    if !table.primary_key.is_empty() {
        lines.push(format!("\tPRIMARY KEY ({})", table.primary_key.join(", ")));
    }

    let mut out = format!("CREATE TABLE {} (\n{}\n)", table.name, lines.join(", \n"));

    if let Some(sample) = sample {
        let header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        out.push_str(&format!(
            "\n\n/*\n{} rows from {} table:\n{}",
            sample.rows.len(),
            table.name,
            header.join("\t")
        ));
        for row in &sample.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|v| truncate(v.as_deref().unwrap_or("None"), SAMPLE_CELL_CHARS))
                .collect();
            out.push('\n');
            out.push_str(&cells.join("\t"));
        }
        out.push_str("\n*/");
    }

    out
}

/// Bounds applied when turning a result set into text.
///
/// Zero disables the corresponding limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultFormat {
    pub max_rows: usize,
    pub max_cell_chars: usize,
}

impl Default for ResultFormat {
    fn default() -> Self {
        Self {
            max_rows: 100,
            max_cell_chars: 300,
        }
    }
}

impl ResultFormat {
    /// Render rows as a list of tuples: `[(1, Alice), (2, None)]`.
    ///
    /// Single-value tuples keep a trailing comma (`[(42,)]`); an empty
    /// result renders as the empty string.
    pub fn render_rows(&self, rows: &[TextRow]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let shown = if self.max_rows == 0 {
            rows.len()
        } else {
            rows.len().min(self.max_rows)
        };

        let tuples: Vec<String> = rows[..shown].iter().map(|row| self.render_tuple(row)).collect();
        let mut out = format!("[{}]", tuples.join(", "));

        if shown < rows.len() {
            out.push_str(&format!(
                "\n({} rows total, showing first {})",
                rows.len(),
                shown
            ));
        }

        out
    }

    fn render_tuple(&self, row: &TextRow) -> String {
        let values: Vec<String> = row
            .iter()
            .map(|v| match v {
                Some(text) => truncate(text, self.max_cell_chars),
                None => "None".to_string(),
            })
            .collect();

        if values.len() == 1 {
            format!("({},)", values[0])
        } else {
            format!("({})", values.join(", "))
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
