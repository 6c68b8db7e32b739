use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::Result;
use crate::layout::ReportSheet;

/// Writes the header row followed by every sheet row. Blank cells are empty fields.
pub fn write_csv<W: Write>(sheet: &ReportSheet, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(sheet.headers())?;
    for row in sheet.rows() {
        csv.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_csv_file(sheet: &ReportSheet, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_csv(sheet, file)?;
    info!(path = %path.display(), rows = sheet.len(), "Wrote order report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::build_sheet;
    use crate::order::{LineItem, Order};

    #[test]
    fn test_header_only_for_empty_sheet() {
        let mut out = Vec::new();
        write_csv(&ReportSheet::default(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Número de Orden,Hora Creación,"));
        assert!(text.trim_end().ends_with("Teléfono,Tipo Envío"));
    }

    #[test]
    fn test_rows_follow_header() {
        let order = Order {
            id: 12,
            number: "12".to_string(),
            shipping_total: "0.00".to_string(),
            line_items: vec![LineItem {
                name: "Taza, grande".to_string(),
                sku: "T-1".to_string(),
                quantity: 1,
                total: "116.00".to_string(),
            }],
            ..Order::default()
        };
        let sheet = build_sheet(&[order]).unwrap();

        let mut out = Vec::new();
        write_csv(&sheet, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("12,,,1,1,T-1,\"Taza, grande\",116.00,"));
        assert!(lines[2].starts_with(",,,2,,,Envío,,,,,12,0,1,E001,1,1"));
    }
}
