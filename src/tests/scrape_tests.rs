//! tests/scrape_tests.rs
//! Pruebas del escaneo de la página de cupos.

#[cfg(test)]
mod tests {
    use crate::models::status_model::CountryStatus;
    use crate::scrape::parse_country_status;

    const CAPS_TABLE: &str = r#"
    <html>
    <body>
      <table>
        <tr><th>Country</th><th>Status</th></tr>
        <tr><td>Argentina</td><td>closed</td></tr>
        <tr><td>Brazil</td><td>open</td></tr>
        <tr><td>Chile</td><td>paused</td></tr>
      </table>
    </body>
    </html>
    "#;

    #[test]
    fn test_parse_finds_country_row() {
        let (status, raw, err) = parse_country_status(CAPS_TABLE, "Brazil");
        assert_eq!(err, None);
        assert_eq!(status, Some(CountryStatus::Open));
        assert!(raw.unwrap().contains("Brazil"), "El excerpt no trae el país");
    }

    #[test]
    fn test_parse_country_match_ignores_case_and_spacing() {
        let html = r#"
        <table>
          <tr><th>Country</th><th>Status</th></tr>
          <tr><td>  BRAZIL </td><td>Paused until further notice</td></tr>
        </table>
        "#;
        let (status, raw, err) = parse_country_status(html, "Brazil");
        assert_eq!(err, None);
        assert_eq!(status, Some(CountryStatus::Paused));
        assert!(raw.unwrap().to_lowercase().contains("paused"));
    }

    #[test]
    fn test_parse_skips_tables_without_expected_headers() {
        let html = r#"
        <table>
          <tr><th>Year</th><th>Places</th></tr>
          <tr><td>Brazil</td><td>open</td></tr>
        </table>
        <table>
          <tr><th>Country</th><th>Status</th></tr>
          <tr><td>Brazil</td><td>closed</td></tr>
        </table>
        "#;
        // La primera tabla no tiene las cabeceras esperadas; vale la segunda.
        let (status, _raw, err) = parse_country_status(html, "Brazil");
        assert_eq!(err, None);
        assert_eq!(status, Some(CountryStatus::Closed));
    }

    #[test]
    fn test_parse_cells_with_inner_markup() {
        let html = r#"
        <table>
          <tr><th><span>Country</span></th><th><span>Status</span></th></tr>
          <tr><td><strong>Brazil</strong></td><td><span class="tag">Open</span></td></tr>
        </table>
        "#;
        let (status, raw, err) = parse_country_status(html, "Brazil");
        assert_eq!(err, None);
        assert_eq!(status, Some(CountryStatus::Open));
        assert_eq!(raw.unwrap(), "Brazil | Open");
    }

    #[test]
    fn test_parse_joins_status_cells() {
        let html = r#"
        <table>
          <tr><th>Country</th><th>Cap</th><th>Status</th></tr>
          <tr><td>Brazil</td><td>cap reached</td><td>paused</td></tr>
        </table>
        "#;
        let (status, raw, err) = parse_country_status(html, "Brazil");
        assert_eq!(err, None);
        assert_eq!(status, Some(CountryStatus::Paused));
        assert_eq!(raw.unwrap(), "Brazil | cap reached paused");
    }

    #[test]
    fn test_parse_missing_country_yields_exact_error() {
        let (status, raw, err) = parse_country_status(CAPS_TABLE, "Uruguay");
        assert_eq!(status, None);
        assert_eq!(raw, None);
        assert_eq!(
            err.as_deref(),
            Some("Uruguay not found or status label missing")
        );
    }

    #[test]
    fn test_parse_unrecognized_label_is_not_a_status() {
        let html = r#"
        <table>
          <tr><th>Country</th><th>Status</th></tr>
          <tr><td>Brazil</td><td>TBC</td></tr>
        </table>
        "#;
        let (status, _raw, err) = parse_country_status(html, "Brazil");
        assert_eq!(status, None);
        assert_eq!(
            err.as_deref(),
            Some("Brazil not found or status label missing")
        );
    }

    #[test]
    fn test_parse_html_without_tables() {
        let (status, _raw, err) = parse_country_status("<html><p>nada</p></html>", "Brazil");
        assert_eq!(status, None);
        assert!(err.is_some());
    }

    #[test]
    fn test_parse_excerpt_truncated_to_500() {
        let long_status = format!("open {}", "x".repeat(600));
        let html = format!(
            r#"
            <table>
              <tr><th>Country</th><th>Status</th></tr>
              <tr><td>Brazil</td><td>{}</td></tr>
            </table>
            "#,
            long_status
        );
        let (status, raw, _err) = parse_country_status(&html, "Brazil");
        assert_eq!(status, Some(CountryStatus::Open));
        assert_eq!(raw.unwrap().chars().count(), 500, "El excerpt no quedó truncado");
    }

    #[test]
    fn test_status_label_normalization() {
        assert_eq!(CountryStatus::from_label("Open"), Some(CountryStatus::Open));
        assert_eq!(
            CountryStatus::from_label("  PAUSED "),
            Some(CountryStatus::Paused)
        );
        assert_eq!(
            CountryStatus::from_label("pause"),
            Some(CountryStatus::Paused)
        );
        assert_eq!(
            CountryStatus::from_label("Closed to applications"),
            Some(CountryStatus::Closed)
        );
        assert_eq!(
            CountryStatus::from_label("Reopened"),
            Some(CountryStatus::Open)
        );
        assert_eq!(CountryStatus::from_label("TBC"), None);
        assert_eq!(CountryStatus::from_label(""), None);
    }
}
