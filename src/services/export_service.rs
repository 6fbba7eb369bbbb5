use crate::error::Result;
use crate::services::admin_query_service::{ExportRow, JOB_UNAVAILABLE};
use rust_xlsxwriter::*;

pub struct ExportService;

impl ExportService {
    fn status_color(status: &str) -> Color {
        match status {
            "Pending" => Color::RGB(0x3B82F6),     // Blue
            "Reviewed" => Color::RGB(0xF59E0B),    // Amber
            "Shortlisted" => Color::RGB(0x8B5CF6), // Violet
            "Hired" => Color::RGB(0x10B981),       // Emerald
            "Rejected" => Color::RGB(0xEF4444),    // Red
            _ => Color::RGB(0x64748B),
        }
    }

    /// Styled workbook with one row per exported application.
    pub fn applications_xlsx(rows: &[ExportRow]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Applications")?;

        let primary_color = Color::RGB(0x1E293B);
        let header_bg = Color::RGB(0x0F172A);
        let header_text = Color::White;
        let alt_row_1 = Color::RGB(0xF8FAFC);
        let alt_row_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);
        let muted = Color::RGB(0x94A3B8);

        let columns = [
            ("#", 6.0),
            ("Applicant", 28.0),
            ("Email", 30.0),
            ("Phone", 18.0),
            ("Job", 32.0),
            ("Company", 22.0),
            ("Location", 20.0),
            ("Type", 14.0),
            ("Applied", 14.0),
            ("Status", 14.0),
            ("Cover Letter", 50.0),
            ("Resume", 40.0),
            ("Notes", 40.0),
        ];
        let last_col = (columns.len() - 1) as u16;

        for (i, (_, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
        }

        let title_format = Format::new()
            .set_font_size(16)
            .set_bold()
            .set_font_color(header_text)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(0, 40)?;
        worksheet.merge_range(0, 0, 0, last_col, "Applications Report", &title_format)?;

        let subtitle_format = Format::new()
            .set_font_size(10)
            .set_italic()
            .set_font_color(muted)
            .set_background_color(primary_color)
            .set_align(FormatAlign::CenterAcross)
            .set_align(FormatAlign::VerticalCenter);
        worksheet.set_row_height(1, 22)?;
        let now = chrono::Utc::now().format("%b %-d, %Y %H:%M UTC").to_string();
        let subtitle = format!("Exported {}  •  {} applications", now, rows.len());
        worksheet.merge_range(1, 0, 1, last_col, &subtitle, &subtitle_format)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(header_text)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let header_row = 2;
        worksheet.set_row_height(header_row, 30)?;
        for (i, (name, _)) in columns.iter().enumerate() {
            worksheet.write_string_with_format(header_row, i as u16, *name, &header_format)?;
        }

        let data_start_row = 3;
        for (idx, item) in rows.iter().enumerate() {
            let row = data_start_row + idx as u32;
            let bg = if idx % 2 == 0 { alt_row_1 } else { alt_row_2 };

            let base_fmt = Format::new()
                .set_font_size(10)
                .set_background_color(bg)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            let center_fmt = base_fmt.clone().set_align(FormatAlign::Center);
            let wrap_fmt = base_fmt.clone().set_text_wrap();
            let name_fmt = base_fmt.clone().set_bold();

            worksheet.set_row_height(row, 22)?;
            worksheet.write_number_with_format(row, 0, item.serial as f64, &center_fmt)?;
            worksheet.write_string_with_format(row, 1, &item.applicant_name, &name_fmt)?;
            worksheet.write_string_with_format(row, 2, &item.email, &base_fmt)?;
            worksheet.write_string_with_format(row, 3, &item.phone, &base_fmt)?;

            if item.job_title == JOB_UNAVAILABLE {
                let missing_fmt = base_fmt.clone().set_italic().set_font_color(muted);
                worksheet.write_string_with_format(row, 4, &item.job_title, &missing_fmt)?;
            } else {
                worksheet.write_string_with_format(row, 4, &item.job_title, &wrap_fmt)?;
            }
            worksheet.write_string_with_format(row, 5, &item.company, &base_fmt)?;
            worksheet.write_string_with_format(row, 6, &item.location, &base_fmt)?;
            worksheet.write_string_with_format(row, 7, &item.employment_type, &center_fmt)?;
            worksheet.write_string_with_format(row, 8, &item.submitted_on, &center_fmt)?;

            let status_fmt = Format::new()
                .set_font_size(10)
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Self::status_color(&item.status))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color);
            worksheet.write_string_with_format(row, 9, &item.status, &status_fmt)?;

            worksheet.write_string_with_format(row, 10, &item.cover_letter, &wrap_fmt)?;
            if item.resume_url.starts_with("http") {
                let link_fmt = base_fmt
                    .clone()
                    .set_font_color(Color::RGB(0x2563EB))
                    .set_underline(FormatUnderline::Single);
                worksheet.write_url_with_format(row, 11, item.resume_url.as_str(), &link_fmt)?;
            } else {
                worksheet.write_string_with_format(row, 11, &item.resume_url, &base_fmt)?;
            }
            worksheet.write_string_with_format(row, 12, &item.notes, &wrap_fmt)?;
        }

        worksheet.set_freeze_panes(3, 0)?;
        let last_row = (data_start_row + rows.len() as u32).saturating_sub(1).max(header_row);
        worksheet.autofilter(header_row, 0, last_row, last_col)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(serial: usize, job_title: &str) -> ExportRow {
        ExportRow {
            serial,
            applicant_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
            job_title: job_title.into(),
            company: "Acme".into(),
            location: "Remote".into(),
            employment_type: "Full-time".into(),
            submitted_on: "Mar 1, 2026".into(),
            status: "Pending".into(),
            cover_letter: String::new(),
            resume_url: "https://files.example.com/cv.pdf".into(),
            notes: String::new(),
        }
    }

    #[test]
    fn workbook_is_a_zip_container() {
        let bytes =
            ExportService::applications_xlsx(&[row(1, "Backend Engineer"), row(2, JOB_UNAVAILABLE)])
                .unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn empty_export_still_produces_a_workbook() {
        let bytes = ExportService::applications_xlsx(&[]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
