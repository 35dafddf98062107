use anyhow::Result;
use movie_roulette::config::Config;
use movie_roulette::filters::FilterSelection;
use movie_roulette::roulette::Roulette;
use movie_roulette::PickerError;
use std::collections::HashSet;
use std::fs;
use tempfile::{tempdir, TempDir};

const MOVIES: &str = "\
title,release_year,content_rating,genres,runtime,tomatometer_rating
Heat,1995,R,\"Action, Crime, Drama\",170 min,87
Paddington 2,2017,PG,\"Comedy, Family\",1h 44m,99
Stalker,1979,N/A,\"Drama, Sci-Fi\",162,84
Alien,1979,R,\"Horror, Sci-Fi\",117,93
";

const STREAMING: &str = "\
title,year,providers
Heat,1995,\"Amazon Prime Video, Netflix, Max\"
Alien,1980,Hulu
";

fn config(dir: &TempDir) -> Result<Config> {
    let root = dir.path();
    fs::write(root.join("movies.csv"), MOVIES)?;
    fs::write(root.join("streaming.csv"), STREAMING)?;
    fs::create_dir_all(root.join("static/posters"))?;
    fs::write(root.join("static/posters/Heat_1995.jpg"), b"jpg")?;

    let mut config = Config::default();
    config.paths.movies_csv = root.join("movies.csv");
    config.paths.streaming_csv = root.join("streaming.csv");
    config.paths.cache_file = root.join("cache/tmdb_cache.json");
    config.paths.bag_file = root.join("shuffle_bag.json");
    config.paths.static_dir = root.join("static");
    config.enrichment.throttle_ms = 0;
    config.enrichment.provider_limit = 2;
    Ok(config)
}

fn rated(rating: &str) -> FilterSelection {
    FilterSelection {
        rated: rating.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_pick_enriches_from_local_poster_and_streaming_data() -> Result<()> {
    let dir = tempdir()?;
    let config = config(&dir)?;
    let app = Roulette::from_config(&config).await?;

    let selection = FilterSelection {
        genre: "crime".to_string(),
        ..Default::default()
    };
    let pick = app.pick(&selection).await?;
    assert_eq!(pick.count, 1);
    assert_eq!(pick.movie.title, "Heat");
    assert_eq!(pick.details.poster.as_deref(), Some("/static/posters/Heat_1995.jpg"));

    let names: Vec<&str> = pick.details.providers.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Netflix", "HBO Max"]);
    // No API keys configured, so both remote sources report why they were skipped
    assert!(pick.details.errors.contains_key("tmdb"));
    assert!(pick.details.errors.contains_key("omdb"));
    assert!(config.paths.cache_file.exists());
    Ok(())
}

#[tokio::test]
async fn test_bag_cycles_through_filtered_movies_across_restarts() -> Result<()> {
    let dir = tempdir()?;
    let config = config(&dir)?;

    let first = Roulette::from_config(&config).await?.pick(&rated("R")).await?;
    // A fresh process resumes the persisted bag
    let second = Roulette::from_config(&config).await?.pick(&rated("R")).await?;

    let titles: HashSet<String> = [first.movie.title, second.movie.title].into_iter().collect();
    assert_eq!(titles, HashSet::from(["Heat".to_string(), "Alien".to_string()]));
    Ok(())
}

#[tokio::test]
async fn test_year_drift_and_placeholder() -> Result<()> {
    let dir = tempdir()?;
    let config = config(&dir)?;
    let app = Roulette::from_config(&config).await?;

    let details = app.enricher().get_details("Alien", Some(1979)).await;
    assert_eq!(details.poster.as_deref(), Some("/static/placeholder.png"));
    assert_eq!(details.providers.len(), 1);
    assert_eq!(details.providers[0].name, "Hulu");
    Ok(())
}

#[tokio::test]
async fn test_overview_and_empty_selection() -> Result<()> {
    let dir = tempdir()?;
    let app = Roulette::from_config(&config(&dir)?).await?;

    let overview = app.overview(&FilterSelection::default());
    assert_eq!(overview.total, 4);
    assert_eq!(overview.count, 4);
    assert_eq!(overview.options.ratings, vec!["Any", "PG", "R"]);

    let short = FilterSelection {
        runtime: "<90".to_string(),
        ..Default::default()
    };
    assert_eq!(app.overview(&short).count, 0);
    assert!(matches!(app.pick(&short).await, Err(PickerError::EmptyCandidates)));
    Ok(())
}

#[tokio::test]
async fn test_blank_csv_fields_filled_from_cached_metadata() -> Result<()> {
    let dir = tempdir()?;
    let mut config = config(&dir)?;
    fs::write(&config.paths.movies_csv, "title,release_year\nHeat,1995\nAlien,1979\n")?;
    fs::create_dir_all(dir.path().join("cache"))?;
    fs::write(
        &config.paths.cache_file,
        r#"{
            "heat|||1995": {
                "poster": "https://image.tmdb.org/t/p/w500/heat.jpg",
                "plot": "A heist crew and a detective.",
                "providers": [{"name": "Netflix"}],
                "rated": "R",
                "genre": "Crime, Drama",
                "runtime_min": 170
            }
        }"#,
    )?;

    let app = Roulette::from_config(&config).await?;
    let heat = &app.movies()[0];
    assert_eq!(heat.rating, "R");
    assert_eq!(heat.genre, "Crime, Drama");
    assert_eq!(heat.runtime_min, Some(170));
    // Nothing cached or reachable for Alien without API keys
    assert_eq!(app.movies()[1].rating, "");

    let overview = app.overview(&FilterSelection {
        runtime: "150+".to_string(),
        ..Default::default()
    });
    assert_eq!(overview.count, 1);
    assert_eq!(overview.options.ratings, vec!["Any", "R"]);
    assert!(overview.options.genres.contains(&"Crime".to_string()));

    config.enrichment.fill_missing_fields = false;
    let raw = Roulette::from_config(&config).await?;
    assert_eq!(raw.movies()[0].rating, "");
    Ok(())
}
