use crate::error::Result;
use crate::models::record::{Column, LanguageFilter, Record, COLUMNS};
use crate::utils::csv_line::join_row;
use rust_xlsxwriter::*;

pub struct ExportService;

impl ExportService {
    /// Columns kept for a language choice. Columns without a language
    /// suffix are always kept.
    pub fn columns_for(language: LanguageFilter) -> Vec<Column> {
        COLUMNS
            .iter()
            .copied()
            .filter(|c| c.language().map_or(true, |lang| language.includes(lang)))
            .collect()
    }

    pub fn to_csv(records: &[Record], language: LanguageFilter) -> String {
        let columns = Self::columns_for(language);
        let mut out = join_row(columns.iter().map(|c| c.header()), ',');
        out.push('\n');
        for record in records {
            out.push_str(&join_row(columns.iter().map(|c| record.value(*c)), ','));
            out.push('\n');
        }
        out
    }

    /// Styled XLSX workbook of the same table.
    pub fn to_xlsx(records: &[Record], language: LanguageFilter) -> Result<Vec<u8>> {
        let columns = Self::columns_for(language);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Questions")?;

        let header_bg = Color::RGB(0x0F172A);
        let border_color = Color::RGB(0xE2E8F0);
        let alt_row = Color::RGB(0xF8FAFC);

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        worksheet.set_row_height(0, 30)?;
        for (i, column) in columns.iter().enumerate() {
            let width = match column {
                Column::QuestionText(_) | Column::Explanation(_) => 50.0,
                Column::Option(..) | Column::CorrectAnswer(_) => 28.0,
                Column::SourcePdfName => 30.0,
                _ => 16.0,
            };
            worksheet.set_column_width(i as u16, width)?;
            worksheet.write_string_with_format(0, i as u16, column.header(), &header_format)?;
        }

        for (idx, record) in records.iter().enumerate() {
            let row = 1 + idx as u32;
            let bg = if idx % 2 == 0 { alt_row } else { Color::White };
            let text_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::Top)
                .set_text_wrap()
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let number_fmt = text_fmt.clone().set_align(FormatAlign::Center);

            for (col, column) in columns.iter().enumerate() {
                match record.numeric_value(*column) {
                    Some(n) => {
                        worksheet.write_number_with_format(row, col as u16, n as f64, &number_fmt)?;
                    }
                    None => {
                        worksheet.write_string_with_format(row, col as u16, record.value(*column), &text_fmt)?;
                    }
                }
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        let last_row = (records.len() as u32).max(1);
        worksheet.autofilter(0, 0, last_row, (columns.len() - 1) as u16)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
