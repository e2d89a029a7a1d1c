//! End-to-end run of the model on a small fixture.

use ailmi::economic::impact::{DisplacementMethod, ImpactMethod};
use ailmi::economic::tables::RatePair;
use ailmi::economic::{
    EmploymentMatrix, ImpactCalculator, ImpactInputs, ImpactResult, IndustryAggregator,
    IndustryEmployment, MappingValidator, MonteCarloEngine, NewsArticle, OccupationExtractor,
    ProjectionEngine, Scenario, SocCodeMapper, Tables,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::collections::BTreeMap;

fn raw_occupations() -> serde_json::Value {
    json!({
        "data": {
            "occupations": [
                {"title": "Software Developers", "soc_code": "15-1252", "automation_rate": 35.0, "augmentation_rate": 65.0, "confidence": 0.9},
                {"title": "Customer Service Representatives", "soc": "434051", "automation": 0.55, "augmentation": 0.35},
                {"title": "Team Assemblers", "soc_code": "51-2092", "automation_rate": 0.6, "augmentation_rate": 0.2},
                {"title": "Data Scientist"},
                {"title": "Mystery", "soc_code": "99-9999"},
                7
            ]
        }
    })
}

fn matrix() -> EmploymentMatrix {
    EmploymentMatrix::from_value(&json!({
        "Information": {
            "15-1252": {"employment": 400000},
            "43-4051": {"employment": 100000}
        },
        "Manufacturing": {
            "51-2092": {"employment": 900000},
            "15-1252": {"employment": 100000}
        }
    }))
    .unwrap()
}

fn employment() -> BTreeMap<String, IndustryEmployment> {
    BTreeMap::from([
        (
            "Information".to_string(),
            IndustryEmployment::new(3_000_000.0).with_previous(2_950_000.0),
        ),
        ("Manufacturing".to_string(), IndustryEmployment::new(12_900_000.0)),
        ("Retail Trade".to_string(), IndustryEmployment::new(15_500_000.0)),
        ("Total Nonfarm".to_string(), IndustryEmployment::new(31_400_000.0)),
    ])
}

fn impact(tables: &Tables) -> ImpactResult {
    let mapper = SocCodeMapper::new(tables.soc_groups.clone());
    let report = OccupationExtractor::new(mapper.clone())
        .process(&raw_occupations())
        .unwrap();
    let mapping = IndustryAggregator::new(&mapper, &tables.industries)
        .map(&matrix(), &report.occupation_impacts)
        .unwrap();

    let mut inputs = ImpactInputs::new(2025, 6, employment());
    inputs.industry_rates = Some(mapping.industry_rates);
    inputs.average_rates = report
        .average_rates()
        .map(|(automation, augmentation)| RatePair {
            automation,
            augmentation,
        });
    inputs.ai_job_postings = Some(25_000);
    inputs.news = vec![NewsArticle {
        title: "Company launches AI assistant".into(),
        description: String::new(),
    }];
    ImpactCalculator::new(tables).calculate_net_impact(&inputs).unwrap()
}

#[test]
fn extraction_keeps_valid_records_and_counts_the_rest() {
    let tables = Tables::default();
    let extractor = OccupationExtractor::new(SocCodeMapper::new(tables.soc_groups.clone()));
    let report = extractor.process(&raw_occupations()).unwrap();

    assert!(report.error.is_none());
    assert_eq!(report.occupation_impacts.len(), 4);
    assert_eq!(report.processing_stats.malformed_records, 1);
    assert_eq!(report.processing_stats.invalid_soc_codes, 1);
    for impact in report.occupation_impacts.values() {
        assert!((0.0..=1.0).contains(&impact.automation_rate));
        assert!((0.0..=1.0).contains(&impact.augmentation_rate));
    }

    let validation = extractor.validate_processed(&report).unwrap();
    assert!((0.0..=1.0).contains(&validation.quality_score));
}

#[test]
fn mapped_rates_validate_and_feed_the_impact() {
    let tables = Tables::default();
    let mapper = SocCodeMapper::new(tables.soc_groups.clone());
    let report = OccupationExtractor::new(mapper.clone())
        .process(&raw_occupations())
        .unwrap();
    let mapping = IndustryAggregator::new(&mapper, &tables.industries)
        .map(&matrix(), &report.occupation_impacts)
        .unwrap();

    assert!(mapping.industry_rates.contains_key("Information"));
    assert!(mapping.industry_rates.contains_key("Manufacturing"));
    for rate in mapping.industry_rates.values() {
        assert!((0.0..=1.0).contains(&rate.automation_rate));
        assert!((0.0..=1.0).contains(&rate.confidence));
    }

    let validation = MappingValidator::new(&tables.industries).validate(&mapping.industry_rates);
    assert!((0.0..=1.0).contains(&validation.overall_quality_score));

    let result = impact(&tables);
    assert_eq!(
        result.data_quality.calculation_method,
        ImpactMethod::OccupationWeightedComponentBased
    );
    assert_eq!(
        result.by_industry["Information"].displacement.calculation_method,
        DisplacementMethod::OccupationMapped
    );
    // Retail is missing from the mapping: still mapped, with default rates
    // and no coverage.
    let retail = &result.by_industry["Retail Trade"].displacement;
    assert_eq!(retail.calculation_method, DisplacementMethod::OccupationMapped);
    assert_eq!(retail.data_coverage, 0.0);
    assert_eq!(retail.automation_rate, 0.30);
    assert_eq!(retail.augmentation_rate, 0.70);
    assert_eq!(result.total_employment, 31_400_000.0);
    assert_eq!(result.date, "2025-06");
    assert!(result.total_impact.is_finite());
}

#[test]
fn without_mapping_every_industry_is_uniform() {
    let tables = Tables::default();
    let result = ImpactCalculator::new(&tables)
        .calculate_net_impact(&ImpactInputs::new(2025, 6, employment()))
        .unwrap();

    assert_eq!(result.data_quality.calculation_method, ImpactMethod::ComponentBased);
    for (industry, data) in &result.by_industry {
        assert_eq!(
            data.displacement.calculation_method,
            DisplacementMethod::SimplifiedUniform,
            "{industry}"
        );
    }
    assert_eq!(result.by_industry["Retail Trade"].displacement.automation_rate, 0.30);
}

#[test]
fn projection_and_confidence_from_serialized_impact() {
    let tables = Tables::default();
    let json = serde_json::to_string(&impact(&tables)).unwrap();
    let result: ImpactResult = serde_json::from_str(&json).unwrap();

    let projections = ProjectionEngine::new(&tables, 5)
        .unwrap()
        .generate(&result, &[Scenario::Moderate])
        .unwrap();
    assert_eq!(projections.scenarios.len(), 1);
    let years: Vec<i32> = projections.summary.projections.keys().copied().collect();
    assert_eq!(years, vec![2026, 2027, 2028, 2029, 2030]);
    for band in projections.summary.projections.values() {
        assert!(band.pessimistic <= band.optimistic);
    }
    for yearly in projections.summary.by_industry.values() {
        for p in yearly.values() {
            assert!(p.range[0] <= p.range[1]);
        }
    }

    let engine = MonteCarloEngine::new(&tables.perturbation, 200).unwrap();
    let report = engine
        .run(&result, 3, &mut StdRng::seed_from_u64(2025))
        .unwrap();
    let again = engine
        .run(&result, 3, &mut StdRng::seed_from_u64(2025))
        .unwrap();
    assert_eq!(report.baseline, again.baseline);
    assert_eq!(report.projections, again.projections);

    let overall = report.baseline.overall;
    assert!(overall.p10 <= overall.p25 && overall.p25 <= overall.p50);
    assert!(overall.p50 <= overall.p75 && overall.p75 <= overall.p90);
    assert_eq!(
        report.projections.keys().copied().collect::<Vec<_>>(),
        vec![2026, 2027, 2028]
    );
    assert!(report
        .confidence_by_timeframe
        .values()
        .all(|c| (0.3..=0.95).contains(c)));
}
