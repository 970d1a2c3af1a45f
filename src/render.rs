//! Render Module
//!
//! 正規化済みドキュメントを人間向けに表示するモジュール。
//! Markdown形式では表の列幅を表示幅（全角文字は2）で揃えます。

use std::io::Write;

use unicode_width::UnicodeWidthStr;

use crate::api::RenderFormat;
use crate::document::{Background, Document, Examples, Rule, Scenario, Step};
use crate::error::FeatureSheetError;

/// リスト項目内にネストするブロックのインデント
const NESTED_INDENT: &str = "  ";

/// ドキュメントを指定された形式で出力する
///
/// # 引数
///
/// * `document` - 出力する正規化済みドキュメント
/// * `format` - 出力形式（MarkdownまたはJSON）
/// * `writer` - 出力先のライター
///
/// # 使用例
///
/// ```rust,no_run
/// use featuresheet::{render, Catalog, RenderFormat};
///
/// # fn main() -> Result<(), featuresheet::FeatureSheetError> {
/// let catalog = Catalog::open("features")?;
/// let document = catalog.load("login")?;
/// let mut stdout = std::io::stdout();
/// render(&document, RenderFormat::Markdown, &mut stdout)?;
/// # Ok(())
/// # }
/// ```
pub fn render<W: Write>(
    document: &Document,
    format: RenderFormat,
    writer: &mut W,
) -> Result<(), FeatureSheetError> {
    match format {
        RenderFormat::Markdown => MarkdownRenderer::new(&mut *writer).document(document)?,
        RenderFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, document)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// ドキュメントを文字列として出力する
pub fn render_to_string(
    document: &Document,
    format: RenderFormat,
) -> Result<String, FeatureSheetError> {
    let mut buffer = Vec::new();
    render(document, format, &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| {
        FeatureSheetError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

struct MarkdownRenderer<'w, W: Write> {
    writer: &'w mut W,
}

impl<'w, W: Write> MarkdownRenderer<'w, W> {
    fn new(writer: &'w mut W) -> Self {
        Self { writer }
    }

    fn document(&mut self, document: &Document) -> Result<(), FeatureSheetError> {
        writeln!(self.writer, "# {}", document.name)?;
        self.tags(&document.tags)?;
        self.description(&document.description)?;

        if let Some(background) = &document.background {
            self.background(background, "##")?;
        }

        for rule in &document.rules {
            self.rule(rule)?;
        }

        if !document.scenarios.is_empty() && !document.rules.is_empty() {
            writeln!(self.writer)?;
            writeln!(self.writer, "## Scenarios")?;
        }
        let level = if document.rules.is_empty() { "##" } else { "###" };
        for scenario in &document.scenarios {
            self.scenario(scenario, level)?;
        }
        Ok(())
    }

    fn tags(&mut self, tags: &[String]) -> Result<(), FeatureSheetError> {
        if tags.is_empty() {
            return Ok(());
        }
        let rendered: Vec<String> = tags.iter().map(|tag| format!("`@{}`", tag)).collect();
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", rendered.join(" "))?;
        Ok(())
    }

    fn description(&mut self, description: &str) -> Result<(), FeatureSheetError> {
        let description = description.trim();
        if description.is_empty() {
            return Ok(());
        }
        writeln!(self.writer)?;
        for line in description.lines() {
            writeln!(self.writer, "{}", line.trim())?;
        }
        Ok(())
    }

    fn background(&mut self, background: &Background, level: &str) -> Result<(), FeatureSheetError> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{} {}", level, background.name)?;
        self.steps(&background.steps)
    }

    fn rule(&mut self, rule: &Rule) -> Result<(), FeatureSheetError> {
        writeln!(self.writer)?;
        writeln!(self.writer, "## Rule: {}", rule.name)?;
        self.tags(&rule.tags)?;
        self.description(&rule.description)?;

        if let Some(background) = &rule.background {
            self.background(background, "###")?;
        }
        for scenario in &rule.scenarios {
            self.scenario(scenario, "###")?;
        }
        Ok(())
    }

    fn scenario(&mut self, scenario: &Scenario, level: &str) -> Result<(), FeatureSheetError> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{} {}", level, scenario.name)?;
        self.tags(&scenario.tags)?;
        self.steps(&scenario.steps)?;

        for examples in scenario.examples.iter().flatten() {
            self.examples(examples)?;
        }
        Ok(())
    }

    fn steps(&mut self, steps: &[Step]) -> Result<(), FeatureSheetError> {
        if steps.is_empty() {
            return Ok(());
        }
        writeln!(self.writer)?;
        for step in steps {
            writeln!(self.writer, "- **{}** {}", step.keyword, step.text)?;

            if let Some(doc_string) = &step.doc_string {
                self.doc_string(doc_string)?;
            }
            if let Some(rows) = &step.data_table {
                writeln!(self.writer)?;
                MarkdownTable::new(rows).render(&mut *self.writer, NESTED_INDENT)?;
            }
        }
        Ok(())
    }

    fn doc_string(&mut self, content: &str) -> Result<(), FeatureSheetError> {
        // 内容にバッククォートの連続が含まれる場合はフェンスを長くする
        let fence = "`".repeat(longest_backtick_run(content).max(2) + 1);
        writeln!(self.writer)?;
        writeln!(self.writer, "{}{}", NESTED_INDENT, fence)?;
        for line in content.lines() {
            writeln!(self.writer, "{}{}", NESTED_INDENT, line)?;
        }
        writeln!(self.writer, "{}{}", NESTED_INDENT, fence)?;
        Ok(())
    }

    fn examples(&mut self, examples: &Examples) -> Result<(), FeatureSheetError> {
        writeln!(self.writer)?;
        writeln!(self.writer, "**{}**", examples.name)?;
        if examples.table_header.is_empty() {
            return Ok(());
        }
        let rows: Vec<Vec<String>> = std::iter::once(examples.table_header.clone())
            .chain(examples.table_rows.iter().cloned())
            .collect();
        writeln!(self.writer)?;
        MarkdownTable::new(&rows).render(&mut *self.writer, "")?;
        Ok(())
    }
}

fn longest_backtick_run(content: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in content.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// 列幅を揃えたMarkdownテーブル（1行目をヘッダーとする）
struct MarkdownTable {
    rows: Vec<Vec<String>>,
    cols: usize,
}

impl MarkdownTable {
    fn new(rows: &[Vec<String>]) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<String> = row.iter().map(|cell| escape_cell(cell)).collect();
                // 列数が不足する行は空セルで補う
                cells.resize(cols, String::new());
                cells
            })
            .collect();
        Self { rows, cols }
    }

    fn render<W: Write>(&self, writer: &mut W, indent: &str) -> Result<(), FeatureSheetError> {
        if self.rows.is_empty() || self.cols == 0 {
            return Ok(());
        }

        let widths = self.column_widths();
        let separator: String = widths
            .iter()
            .map(|&width| format!("{}|", "-".repeat(width + 2)))
            .collect();

        for (row_idx, row) in self.rows.iter().enumerate() {
            write!(writer, "{}|", indent)?;
            for (cell, &width) in row.iter().zip(&widths) {
                let padding = width.saturating_sub(cell.width());
                write!(writer, " {}{} |", cell, " ".repeat(padding))?;
            }
            writeln!(writer)?;

            if row_idx == 0 {
                writeln!(writer, "{}|{}", indent, separator)?;
            }
        }
        Ok(())
    }

    /// 最小幅は3（区切り行の`---`）
    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![3; self.cols];
        for row in &self.rows {
            for (col_idx, cell) in row.iter().enumerate() {
                widths[col_idx] = widths[col_idx].max(cell.width());
            }
        }
        widths
    }
}

fn escape_cell(s: &str) -> String {
    s.trim()
        .replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('\n', "<br>")
}
