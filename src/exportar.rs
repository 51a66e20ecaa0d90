//! Report documents built from dashboard statistics: Excel workbook, PDF and
//! a printable HTML page.

use std::path::Path;

use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Document, Element, Margins, SimplePageDecorator};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tera::Context;

use crate::dashboard::{ChartSeries, DashboardStats, LabelCount};
use crate::errors::AppError;
use crate::structs::FotocopiaDetalle;
use crate::TEMPLATES;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn summary_rows(stats: &DashboardStats) -> Vec<(&'static str, String)> {
    let f = &stats.fotocopias;
    vec![
        ("Trabajadores", stats.trabajadores.total.to_string()),
        ("Trabajadores activos", stats.trabajadores.activos.to_string()),
        ("Trabajadores inactivos", stats.trabajadores.inactivos.to_string()),
        ("Registros de fotocopias", f.registros.to_string()),
        ("Páginas B/N", f.paginas_bn.to_string()),
        ("Páginas color", f.paginas_color.to_string()),
        ("Hojas", f.hojas.to_string()),
        ("Facturables B/N", f.facturables_bn.to_string()),
        ("Facturables color", f.facturables_color.to_string()),
        ("Costo B/N", money(f.costo_bn)),
        ("Costo color", money(f.costo_color)),
        ("Costo hojas", money(f.costo_hojas)),
        ("Total", money(f.total)),
        ("Artículos en inventario", stats.inventario.articulos.to_string()),
        ("Unidades en inventario", stats.inventario.unidades.to_string()),
    ]
}

fn write_counts(
    sheet: &mut Worksheet,
    header: &Format,
    title: &str,
    rows: &[LabelCount],
) -> Result<(), AppError> {
    sheet.write_string_with_format(0, 0, title, header)?;
    sheet.write_string_with_format(0, 1, "Total", header)?;
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, &row.etiqueta)?;
        sheet.write_number(r, 1, row.total as f64)?;
    }
    Ok(())
}

fn write_series(sheet: &mut Worksheet, header: &Format, series: &ChartSeries) -> Result<(), AppError> {
    sheet.write_string_with_format(0, 0, "Mes", header)?;
    for (c, dataset) in series.datasets.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16 + 1, &dataset.label, header)?;
    }
    for (i, label) in series.labels.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, label)?;
        for (c, dataset) in series.datasets.iter().enumerate() {
            if let Some(value) = dataset.data.get(i) {
                sheet.write_number(r, c as u16 + 1, *value)?;
            }
        }
    }
    Ok(())
}

/// Workbook with one sheet per dashboard section plus the raw photocopy log.
pub fn to_xlsx(stats: &DashboardStats, records: &[FotocopiaDetalle]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let mut resumen = Worksheet::new();
    resumen.set_name("Resumen")?;
    resumen.write_string_with_format(0, 0, "Indicador", &header)?;
    resumen.write_string_with_format(0, 1, "Valor", &header)?;
    for (i, (label, value)) in summary_rows(stats).iter().enumerate() {
        resumen.write_string(i as u32 + 1, 0, *label)?;
        resumen.write_string(i as u32 + 1, 1, value)?;
    }
    workbook.push_worksheet(resumen);

    let mut por_mes = Worksheet::new();
    por_mes.set_name("Fotocopias por mes")?;
    write_series(&mut por_mes, &header, &stats.fotocopias_por_mes)?;
    workbook.push_worksheet(por_mes);

    let mut departamentos = Worksheet::new();
    departamentos.set_name("Departamentos")?;
    write_counts(
        &mut departamentos,
        &header,
        "Departamento",
        &stats.trabajadores.por_departamento,
    )?;
    workbook.push_worksheet(departamentos);

    let mut registros = Worksheet::new();
    registros.set_name("Registros")?;
    let columns = [
        "ID",
        "Fecha",
        "Tipo",
        "Páginas",
        "Copias",
        "Doble hoja",
        "Total páginas",
        "Hojas",
        "Comentario",
    ];
    for (c, name) in columns.iter().enumerate() {
        registros.write_string_with_format(0, c as u16, *name, &header)?;
    }
    for (i, d) in records.iter().enumerate() {
        let r = i as u32 + 1;
        let f = &d.fotocopia;
        registros.write_number(r, 0, f.id as f64)?;
        registros.write_string(r, 1, &f.registrado_en)?;
        registros.write_string(r, 2, f.tipo.as_str())?;
        registros.write_number(r, 3, f.cantidad as f64)?;
        registros.write_number(r, 4, f.multiplicador as f64)?;
        registros.write_string(r, 5, if f.doble_hoja { "Sí" } else { "No" })?;
        registros.write_number(r, 6, d.paginas as f64)?;
        registros.write_number(r, 7, d.hojas as f64)?;
        registros.write_string(r, 8, f.comentario.as_deref().unwrap_or(""))?;
    }
    workbook.push_worksheet(registros);

    Ok(workbook.save_to_buffer()?)
}

/// A4 summary report. Needs the `LiberationSans-*.ttf` family in `fonts_dir`.
pub fn to_pdf(stats: &DashboardStats, fonts_dir: &Path) -> Result<Vec<u8>, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, "LiberationSans", None).map_err(|e| {
        log::error!(
            "Failed to load fonts from {}: {}",
            fonts_dir.display(),
            e
        );
        AppError::Export(format!("could not load report fonts: {}", e))
    })?;

    let mut doc = Document::new(font_family);
    doc.set_title("Reporte del panel");
    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(Margins::trbl(15, 15, 15, 15));
    doc.set_page_decorator(decorator);

    let s_title = Style::new().with_font_size(16).bold();
    let s_section = Style::new().with_font_size(12).bold();
    let s_normal = Style::new().with_font_size(9);
    let s_bold = Style::new().with_font_size(9).bold();

    doc.push(Paragraph::new("Reporte del panel").styled(s_title));
    doc.push(Paragraph::new(format!("Generado: {}", stats.generado_en)).styled(s_normal));
    doc.push(Break::new(1.0));

    doc.push(Paragraph::new("Resumen").styled(s_section));
    let mut summary = TableLayout::new(vec![3, 2]);
    summary.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    for (label, value) in summary_rows(stats) {
        summary
            .row()
            .element(Paragraph::new(label).styled(s_normal))
            .element(Paragraph::new(value).styled(s_bold))
            .push()?;
    }
    doc.push(summary);
    doc.push(Break::new(1.0));

    let series = &stats.fotocopias_por_mes;
    if !series.labels.is_empty() {
        doc.push(Paragraph::new("Fotocopias por mes").styled(s_section));
        let mut widths = vec![2];
        widths.extend(std::iter::repeat(2).take(series.datasets.len()));
        let mut table = TableLayout::new(widths);
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

        let mut head = table.row().element(Paragraph::new("Mes").styled(s_bold));
        for dataset in &series.datasets {
            head = head.element(Paragraph::new(dataset.label.as_str()).styled(s_bold));
        }
        head.push()?;

        for (i, label) in series.labels.iter().enumerate() {
            let mut row = table.row().element(Paragraph::new(label.as_str()).styled(s_normal));
            for dataset in &series.datasets {
                let value = dataset.data.get(i).copied().unwrap_or_default();
                row = row.element(Paragraph::new(format!("{}", value)).styled(s_normal));
            }
            row.push()?;
        }
        doc.push(table);
        doc.push(Break::new(1.0));
    }

    if !stats.trabajadores.por_departamento.is_empty() {
        doc.push(Paragraph::new("Trabajadores por departamento").styled(s_section));
        let mut table = TableLayout::new(vec![3, 1]);
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
        for row in &stats.trabajadores.por_departamento {
            table
                .row()
                .element(Paragraph::new(row.etiqueta.as_str()).styled(s_normal))
                .element(Paragraph::new(row.total.to_string()).styled(s_normal))
                .push()?;
        }
        doc.push(table);
    }

    let mut buffer = Vec::new();
    doc.render(&mut buffer)?;
    Ok(buffer)
}

pub fn to_html(stats: &DashboardStats) -> Result<String, AppError> {
    let mut context = Context::from_serialize(stats)?;
    context.insert("resumen", &summary_rows(stats));
    let rendered = TEMPLATES.render("reporte.html", &context).map_err(|e| {
        log::error!("Failed to render template: {}", e);
        AppError::TemplateError(e)
    })?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::build_stats;
    use crate::structs::{Fotocopia, PrecioConfig, TipoCopia};

    fn sample() -> (DashboardStats, Vec<FotocopiaDetalle>) {
        let record = Fotocopia {
            id: 1,
            cantidad: 9,
            multiplicador: 10,
            tipo: TipoCopia::Bn,
            doble_hoja: true,
            tipo_hoja_id: None,
            comentario: Some("Guías <3>".into()),
            usuario_id: 1,
            registrado_en: "2025-04-02T12:00:00Z".into(),
        };
        let prices = PrecioConfig {
            precio_bn: 0.05,
            precio_color: 0.25,
            precio_hoja: 0.01,
            fotocopia_gracia_bn: 0,
            fotocopia_gracia_color: 0,
        };
        let stats = build_stats(&[], std::slice::from_ref(&record), &prices, &[]);
        let detail = FotocopiaDetalle {
            fotocopia: record,
            paginas: 90,
            hojas: 50,
        };
        (stats, vec![detail])
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let (stats, records) = sample();
        let bytes = to_xlsx(&stats, &records).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn html_report_includes_totals_and_months() {
        let (stats, _) = sample();
        let html = to_html(&stats).unwrap();
        assert!(html.contains("Reporte del panel"));
        assert!(html.contains("2025-04"));
        assert!(html.contains("5.00"));
    }

    #[test]
    fn pdf_without_fonts_is_an_export_error() {
        let (stats, _) = sample();
        let missing = Path::new("/nonexistent/fonts");
        assert!(matches!(to_pdf(&stats, missing), Err(AppError::Export(_))));
    }
}
