//! scrape.rs
//! Escaneo del HTML de la página de cupos. Buscamos la tabla cuya fila de
//! cabecera tenga las columnas Country y Status y dentro de ella la fila
//! del país objetivo. Matching de texto plano, sin parser de HTML real.

use crate::models::status_model::CountryStatus;

/// Devuelve (status, raw_excerpt, error). Exactamente uno de status/error
/// queda seteado; el excerpt acompaña al status cuando hubo match.
pub fn parse_country_status(
    html: &str,
    country: &str,
) -> (Option<CountryStatus>, Option<String>, Option<String>) {
    let mut pos = 0usize;
    while let Some((tb_start, tb_end)) = next_block_ci(html, "<table", "</table>", pos) {
        let table = &html[tb_start..tb_end];
        pos = tb_end;

        let mut rows: Vec<&str> = Vec::new();
        let mut tr_pos = 0usize;
        while let Some((tr_start, tr_end)) = next_block_ci(table, "<tr", "</tr>", tr_pos) {
            rows.push(&table[tr_start..tr_end]);
            tr_pos = tr_end;
        }
        if rows.is_empty() {
            continue;
        }

        // Solo nos interesan tablas con cabeceras 'Country' y 'Status'.
        let header = collect_cells(rows[0]).join(" ").to_lowercase();
        if !(header.contains("country") && header.contains("status")) {
            continue;
        }

        for row in &rows[1..] {
            let cells = collect_cells(row);
            if cells.is_empty() {
                continue;
            }
            let country_cell = cells[0].trim();
            if !country_cell.eq_ignore_ascii_case(country.trim()) {
                continue;
            }
            let status_text = cells[1..].join(" ");
            if let Some(status) = CountryStatus::from_label(&status_text) {
                let excerpt: String = format!("{} | {}", country_cell, status_text)
                    .chars()
                    .take(500)
                    .collect();
                return (Some(status), Some(excerpt), None);
            }
        }
    }

    (
        None,
        None,
        Some(format!("{} not found or status label missing", country)),
    )
}

/// Busca el siguiente bloque `<open ...> ... </close>` a partir de `from`,
/// insensible a mayúsculas. Devuelve los offsets (inicio, fin) en bytes,
/// incluyendo ambos tags. Los patrones se pasan ya en minúsculas.
fn next_block_ci(s: &str, open_pat: &str, close_pat: &str, from: usize) -> Option<(usize, usize)> {
    let lower = ascii_lower(s);
    let start = lower.get(from..)?.find(open_pat)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let close_rel = lower[open_end..].find(close_pat)?;
    let end = open_end + close_rel + close_pat.len();
    Some((start, end))
}

/// Celdas (td/th) de una fila, en orden del documento, ya sin tags
/// y con el espacio en blanco normalizado.
fn collect_cells(row: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut pos = 0usize;
    loop {
        let td = next_block_ci(row, "<td", "</td>", pos);
        let th = next_block_ci(row, "<th", "</th>", pos);
        let (start, end) = match (td, th) {
            (Some(td), Some(th)) if th.0 < td.0 => th,
            (Some(td), _) => td,
            (None, Some(th)) => th,
            (None, None) => break,
        };
        cells.push(normalize_ws(&strip_tags(&normalize_entities(&row[start..end]))));
        pos = end;
    }
    cells
}

// Minúsculas solo en ASCII: conserva la longitud en bytes, así los
// offsets sobre la copia en minúsculas valen sobre el original.
fn ascii_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ").replace("&amp;", "&")
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
