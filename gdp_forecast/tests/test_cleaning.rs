use assert_approx_eq::assert_approx_eq;
use gdp_forecast::cleaning::PanelCleaner;
use gdp_forecast::config::PanelSchema;
use gdp_forecast::data::{PanelRow, RawPanel};
use gdp_forecast::error::ForecastError;
use pretty_assertions::assert_eq;

const KPI: &str = "Real GDP growth (annual %)";

fn panel(rows: Vec<PanelRow>) -> RawPanel {
    RawPanel::new(PanelSchema::default(), rows)
}

fn values(panel: &gdp_forecast::CleanedPanel, country: &str) -> Vec<Option<f64>> {
    panel.series(country).map(|o| o.value).collect()
}

#[test]
fn test_interior_gaps_are_interpolated() {
    let raw = panel(vec![PanelRow::new(
        "Kenya",
        KPI,
        &[
            (2012, Some(4.0)),
            (2013, None),
            (2014, None),
            (2015, Some(7.0)),
        ],
    )]);

    let cleaned = PanelCleaner::new(KPI).clean(&raw).unwrap();
    let kenya = values(&cleaned, "Kenya");

    assert_eq!(kenya.len(), 4);
    assert_approx_eq!(kenya[1].unwrap(), 5.0);
    assert_approx_eq!(kenya[2].unwrap(), 6.0);
    assert!(!cleaned.has_missing());
}

#[test]
fn test_leading_gaps_stay_missing_and_trailing_gaps_hold() {
    let raw = panel(vec![PanelRow::new(
        "Nigeria",
        KPI,
        &[
            (2011, None),
            (2012, None),
            (2013, Some(5.4)),
            (2014, Some(6.3)),
            (2015, None),
        ],
    )]);

    let cleaned = PanelCleaner::new(KPI).clean(&raw).unwrap();
    let nigeria = values(&cleaned, "Nigeria");

    assert_eq!(nigeria, vec![None, None, Some(5.4), Some(6.3), Some(6.3)]);
    assert!(cleaned.has_missing());

    let observed = cleaned.drop_missing();
    assert_eq!(observed.len(), 3);
    assert!(!observed.has_missing());
    assert_eq!(observed.observations()[0].year(), 2013);
}

#[test]
fn test_output_is_sorted_by_country_then_date() {
    let raw = panel(vec![
        PanelRow::new("South Africa", KPI, &[(2015, Some(1.3)), (2014, Some(1.8))]),
        PanelRow::new("Kenya", KPI, &[(2015, Some(5.7)), (2014, Some(5.4))]),
    ]);

    let cleaned = PanelCleaner::new(KPI).clean(&raw).unwrap();
    let keys: Vec<(String, i32)> = cleaned
        .observations()
        .iter()
        .map(|o| (o.country.clone(), o.year()))
        .collect();

    assert_eq!(
        keys,
        vec![
            ("Kenya".to_string(), 2014),
            ("Kenya".to_string(), 2015),
            ("South Africa".to_string(), 2014),
            ("South Africa".to_string(), 2015),
        ]
    );
}

#[test]
fn test_other_indicators_are_ignored() {
    let raw = panel(vec![
        PanelRow::new("Kenya", KPI, &[(2014, Some(5.4)), (2015, Some(5.7))]),
        PanelRow::new("Kenya", "Population, total", &[(2014, Some(46.0)), (2015, Some(47.0))]),
    ]);

    let cleaned = PanelCleaner::new(KPI).clean(&raw).unwrap();
    assert_eq!(cleaned.len(), 2);
    assert_eq!(cleaned.countries(), vec!["Kenya".to_string()]);
}

#[test]
fn test_kpi_not_found() {
    let raw = panel(vec![PanelRow::new(
        "Kenya",
        "Population, total",
        &[(2014, Some(46.0)), (2015, Some(47.0))],
    )]);

    match PanelCleaner::new(KPI).clean(&raw) {
        Err(ForecastError::KpiNotFound(name)) => assert_eq!(name, KPI),
        other => panic!("Expected KpiNotFound, got {:?}", other),
    }
}

#[test]
fn test_insufficient_country_is_excluded() {
    let raw = panel(vec![
        PanelRow::new("Kenya", KPI, &[(2014, Some(5.4)), (2015, Some(5.7))]),
        PanelRow::new("Nigeria", KPI, &[(2014, None), (2015, Some(2.7))]),
        PanelRow::new("South Africa", KPI, &[(2014, None), (2015, None)]),
    ]);

    let cleaned = PanelCleaner::new(KPI).clean(&raw).unwrap();

    assert_eq!(cleaned.countries(), vec!["Kenya".to_string()]);
    assert_eq!(
        cleaned.excluded().keys().cloned().collect::<Vec<_>>(),
        vec!["Nigeria".to_string(), "South Africa".to_string()]
    );
    assert!(cleaned.excluded()["Nigeria"].contains("Nigeria"));
    assert_eq!(cleaned.drop_missing().excluded(), cleaned.excluded());
}

#[test]
fn test_duplicate_kpi_rows_are_rejected() {
    let raw = panel(vec![
        PanelRow::new("Kenya", KPI, &[(2014, Some(5.4)), (2015, Some(5.7))]),
        PanelRow::new("Kenya", KPI, &[(2014, Some(5.0)), (2015, Some(5.1))]),
    ]);

    assert!(matches!(
        PanelCleaner::new(KPI).clean(&raw),
        Err(ForecastError::DataError(_))
    ));
}

#[test]
fn test_cleaning_is_idempotent() {
    let raw = panel(vec![
        PanelRow::new(
            "Kenya",
            KPI,
            &[(2010, None), (2011, Some(6.1)), (2012, None), (2013, Some(5.9)), (2014, None)],
        ),
        PanelRow::new("Nigeria", KPI, &[(2010, Some(8.0)), (2011, None), (2012, None), (2013, Some(5.4))]),
    ]);

    let cleaner = PanelCleaner::new(KPI);
    let once = cleaner.clean(&raw).unwrap();

    let rebuilt = panel(
        once.countries()
            .iter()
            .map(|country| {
                let points: Vec<(i32, Option<f64>)> =
                    once.series(country).map(|o| (o.year(), o.value)).collect();
                PanelRow::new(country, KPI, &points)
            })
            .collect(),
    );
    let twice = cleaner.clean(&rebuilt).unwrap();

    assert_eq!(once, twice);
}
