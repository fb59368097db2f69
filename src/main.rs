//! End-to-end rental price ensemble demo
//!
//! This program demonstrates how to:
//! 1. Load (or synthesize) an analytical dataset of rental listings
//! 2. Fit the feature transformation pipeline
//! 3. Train the model suite and derive ensemble weights
//! 4. Persist the fitted bundle and serve predictions from it

use anyhow::Result;
use rent_ensemble::data::{load_records, Furnished, PropertyRecord, PropertyType, Tier};
use rent_ensemble::features::FeaturePipeline;
use rent_ensemble::models::{
    ensemble_weights, evaluate_suite, train_model_suite, train_validation_split, SuiteParams,
};
use rent_ensemble::predict::{ModelBundle, PropertyRequest, RentPredictor};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const BUNDLE_PATH: &str = "models/bundle.json";

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("\n{}", "=".repeat(60));
    println!("  Rental Price Ensemble");
    println!("{}\n", "=".repeat(60));

    let records = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading analytical dataset from {}", path);
            load_records(&path)?
        }
        None => {
            info!("No dataset path given, using built-in sample listings");
            sample_records()
        }
    };
    println!("Loaded {} listings", records.len());

    // Fit the feature pipeline
    println!("\n1. Fitting feature pipeline");
    println!("{}", "-".repeat(40));

    let mut pipeline = FeaturePipeline::new();
    let (x, y, feature_names) = pipeline.fit_transform(&records)?;
    println!(
        "   {} samples transformed into {} features",
        x.len(),
        feature_names.len()
    );

    // Train the suite
    println!("\n2. Training model suite");
    println!("{}", "-".repeat(40));

    let ((x_train, y_train), (x_val, y_val)) = train_validation_split(&x, &y, 0.8, 42);
    println!("   Train: {} samples", x_train.len());
    println!("   Validation: {} samples", x_val.len());

    let models = train_model_suite(&x_train, &y_train, &SuiteParams::default())?;
    let scores = evaluate_suite(&models, &x_val, &y_val)?;
    let weights = ensemble_weights(&scores);

    println!("\n   Validation scores and ensemble weights:");
    let mut names: Vec<&String> = weights.keys().collect();
    names.sort();
    for name in names {
        println!(
            "   {:14} MAPE {:6.2}%  ->  weight {:.3}",
            name, scores[name].mape, weights[name]
        );
    }

    // Persist and reload the bundle
    println!("\n3. Persisting fitted bundle");
    println!("{}", "-".repeat(40));

    std::fs::create_dir_all("models")?;
    let bundle = ModelBundle::new(models, weights, pipeline);
    bundle.save(BUNDLE_PATH)?;

    let predictor = RentPredictor::from_bundle(ModelBundle::load(BUNDLE_PATH)?)?;
    println!("   Bundle written and reloaded from {}", BUNDLE_PATH);

    // Serve a prediction
    println!("\n4. Sample prediction");
    println!("{}", "-".repeat(40));

    let request = PropertyRequest {
        neighborhood: "Dubai Marina".to_string(),
        property_type: "2BR".to_string(),
        size_sqft: 1200.0,
        bedrooms: 2,
        bathrooms: 2,
        amenity_count: 7,
        tier: "Luxury".to_string(),
        furnished: "Furnished".to_string(),
        has_metro: true,
        beach_accessible: true,
        amenities: vec![
            "Swimming Pool".to_string(),
            "Gym".to_string(),
            "Parking".to_string(),
            "Balcony".to_string(),
        ],
    };

    let result = predictor.predict(&request)?;
    println!(
        "   Predicted rent: {:.0} AED/year ({:.0} - {:.0})",
        result.prediction, result.confidence_lower, result.confidence_upper
    );
    for (name, prediction) in &result.individual {
        println!("   {:14} {:.0}", name, prediction);
    }

    let listed_price = result.prediction * 1.15;
    let comparison = predictor.compare_with_market(&request, listed_price)?;
    println!(
        "\n   Listed at {:.0} AED/year: {} ({:+.1}% vs predicted)",
        comparison.listed_price,
        comparison.status.as_str(),
        comparison.percent_difference
    );

    Ok(())
}

/// Deterministic sample listings so the demo runs without a dataset file
fn sample_records() -> Vec<PropertyRecord> {
    let neighborhoods = [
        ("Dubai Marina", Tier::Luxury, true, true, 120.0),
        ("Downtown Dubai", Tier::Luxury, true, false, 130.0),
        ("Business Bay", Tier::Premium, true, false, 95.0),
        ("Al Barsha", Tier::MidMarket, false, false, 70.0),
        ("Deira", Tier::Budget, true, false, 50.0),
        ("International City", Tier::Budget, false, false, 40.0),
    ];
    let types = [
        (PropertyType::Studio, 450.0, 0, 1),
        (PropertyType::OneBr, 750.0, 1, 1),
        (PropertyType::TwoBr, 1200.0, 2, 2),
        (PropertyType::ThreeBr, 1700.0, 3, 3),
        (PropertyType::Villa, 3200.0, 4, 4),
    ];

    let mut records = Vec::new();
    for (i, &(neighborhood, tier, has_metro, beach, ppsf)) in neighborhoods.iter().enumerate() {
        for (j, &(property_type, base_size, bedrooms, bathrooms)) in types.iter().enumerate() {
            for k in 0..4 {
                let size = base_size * (1.0 + 0.05 * k as f64);
                let amenity_count = ((i + j + k) % 8) as u32;
                let rent = ppsf * size * (1.0 + 0.02 * amenity_count as f64);
                records.push(PropertyRecord {
                    neighborhood: neighborhood.to_string(),
                    property_type,
                    size_sqft: size,
                    bedrooms,
                    bathrooms,
                    amenity_count,
                    tier,
                    furnished: match k % 3 {
                        0 => Furnished::Unfurnished,
                        1 => Furnished::Semi,
                        _ => Furnished::Fully,
                    },
                    has_metro,
                    beach_accessible: beach,
                    has_pool: amenity_count >= 4,
                    has_gym: amenity_count >= 3,
                    has_parking: amenity_count >= 1,
                    has_balcony: amenity_count >= 5,
                    price_per_sqft: rent / size,
                    annual_rent: Some(rent),
                });
            }
        }
    }

    records
}
