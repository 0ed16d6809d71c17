//! Standalone HTML rendering of a `RosterTable` through a handlebars template.
//!
//! Text values are escaped by handlebars; the template never uses raw
//! (`{{{ }}}`) output.

use super::{weekday_name, RosterTable, RowCells, TaskSection};
use chrono::NaiveDate;
use handlebars::Handlebars;
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;

const DOCUMENT_TEMPLATE: &str = "roster_document";

static TEMPLATES: OnceCell<Handlebars<'static>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid roster template: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("failed to render roster document: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Serialize)]
struct DocumentView<'a> {
    headline: &'a str,
    generated_on: String,
    sections: Vec<SectionView<'a>>,
}

#[derive(Serialize)]
struct SectionView<'a> {
    task: &'a str,
    /// Date and weekday columns plus one per role.
    span: usize,
    roles: Vec<&'a str>,
    rows: Vec<RowView<'a>>,
}

#[derive(Serialize)]
struct RowView<'a> {
    day: String,
    weekday: &'static str,
    columns: usize,
    tag: Option<&'a str>,
    cells: Vec<&'a str>,
}

/// Renders the full document. `generated_on` goes into the footer.
pub fn render_document(
    headline: &str,
    table: &RosterTable,
    generated_on: NaiveDate,
) -> Result<String, RenderError> {
    let view = DocumentView {
        headline,
        generated_on: generated_on.format("%d.%m.%Y").to_string(),
        sections: table.sections.iter().map(section_view).collect(),
    };
    Ok(templates()?.render(DOCUMENT_TEMPLATE, &view)?)
}

fn templates() -> Result<&'static Handlebars<'static>, RenderError> {
    TEMPLATES.get_or_try_init(|| {
        let mut handlebars = Handlebars::new();
        handlebars.register_template_string(DOCUMENT_TEMPLATE, include_str!("roster.html.hbs"))?;
        Ok(handlebars)
    })
}

fn section_view(section: &TaskSection) -> SectionView<'_> {
    let columns = section.roles.len();
    SectionView {
        task: &section.task.descr,
        span: columns + 2,
        roles: section.roles.iter().map(|role| role.descr.as_str()).collect(),
        rows: section
            .rows
            .iter()
            .map(|row| {
                let (tag, cells) = match &row.cells {
                    RowCells::Tagged(tag) => (Some(tag.as_str()), Vec::new()),
                    RowCells::Roles(cells) => (
                        None,
                        cells
                            .iter()
                            .map(|cell| cell.as_deref().unwrap_or(""))
                            .collect(),
                    ),
                };
                RowView {
                    day: row.date.format("%d.%m.").to_string(),
                    weekday: weekday_name(row.date),
                    columns,
                    tag,
                    cells,
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::roster::{Role, Task};
    use crate::render::TableRow;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service_section(rows: Vec<TableRow>) -> RosterTable {
        RosterTable {
            sections: vec![TaskSection {
                task: Task {
                    id: 1,
                    descr: "Service".to_string(),
                    order_number: Some(1),
                },
                roles: vec![
                    Role {
                        id: 1,
                        task_id: 1,
                        descr: "Reader".to_string(),
                        order_number: Some(1),
                    },
                    Role {
                        id: 2,
                        task_id: 1,
                        descr: "Usher".to_string(),
                        order_number: Some(2),
                    },
                ],
                rows,
            }],
        }
    }

    #[test]
    fn tagged_row_spans_all_role_columns() {
        let table = service_section(vec![TableRow {
            date: date(2024, 3, 8),
            cells: RowCells::Tagged("Holiday".to_string()),
        }]);

        let html = render_document("March 2024", &table, date(2024, 3, 8)).unwrap();

        assert!(html.contains("<h1>March 2024</h1>"));
        assert!(html.contains("<th colspan=\"4\">Service</th>"));
        assert!(html.contains("<td colspan=\"2\">Holiday</td>"));
        assert!(html.contains("<td>Friday</td>"));
        assert!(html.contains("As of 08.03.2024"));
    }

    #[test]
    fn role_cells_are_escaped_and_open_slots_blank() {
        let table = service_section(vec![TableRow {
            date: date(2024, 3, 1),
            cells: RowCells::Roles(vec![Some("Tom & <Jerry>".to_string()), None]),
        }]);

        let html = render_document("March 2024", &table, date(2024, 3, 1)).unwrap();

        assert!(html.contains("<td>Tom &amp; &lt;Jerry&gt;</td><td></td>"));
        assert!(!html.contains("<Jerry>"));
    }
}
