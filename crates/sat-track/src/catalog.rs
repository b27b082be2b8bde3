//! Element set catalog loading and satellite selection

use crate::{Result, TrackError};
use orbital_mechanics::tle::{parse_catalog, parse_catalog_lossy};
use orbital_mechanics::Tle;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Which record of the catalog to track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    First,
    /// Case-insensitive title; an exact title wins over partial matches
    Name(String),
    Norad(u32),
}

impl Selector {
    pub fn from_args(name: Option<String>, norad: Option<u32>) -> Self {
        match (norad, name) {
            (Some(id), _) => Selector::Norad(id),
            (None, Some(name)) => Selector::Name(name),
            (None, None) => Selector::First,
        }
    }
}

/// Read every record of a catalog file. With `lossy`, malformed records are
/// skipped with a warning instead of failing the load.
pub fn load_catalog(path: &Path, lossy: bool) -> Result<Vec<Tle>> {
    info!("Loading element sets from {:?}", path);
    let text = fs::read_to_string(path).map_err(|source| TrackError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = if lossy {
        let (records, rejected) = parse_catalog_lossy(&text);
        if !rejected.is_empty() {
            warn!("Skipped {} malformed records in {:?}", rejected.len(), path);
        }
        records
    } else {
        parse_catalog(&text)?
    };

    if records.is_empty() {
        return Err(TrackError::EmptyCatalog(path.to_path_buf()));
    }
    info!("Loaded {} element sets", records.len());
    Ok(records)
}

pub fn select<'a>(catalog: &'a [Tle], selector: &Selector) -> Result<&'a Tle> {
    match selector {
        Selector::First => catalog
            .first()
            .ok_or_else(|| TrackError::NoMatch("an empty catalog".to_string())),
        Selector::Norad(id) => catalog
            .iter()
            .find(|tle| tle.satellite_number() == *id)
            .ok_or_else(|| TrackError::NoMatch(format!("NORAD id {}", id))),
        Selector::Name(query) => {
            let title = |tle: &Tle| tle.name.clone().unwrap_or_default();
            if let Some(exact) = catalog
                .iter()
                .find(|tle| title(tle).eq_ignore_ascii_case(query))
            {
                return Ok(exact);
            }

            let needle = query.to_lowercase();
            let matches: Vec<&Tle> = catalog
                .iter()
                .filter(|tle| title(tle).to_lowercase().contains(&needle))
                .collect();
            match matches.as_slice() {
                [one] => Ok(*one),
                [] => Err(TrackError::NoMatch(format!("name '{}'", query))),
                many => Err(TrackError::Ambiguous {
                    query: query.clone(),
                    matches: many.iter().map(|tle| tle.display_name()).collect(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = "\
ISS (ZARYA)
1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008
1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753
2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667
ISS DEORBIT TEST
1 25545U 98067B   20194.88612269 -.00002218  00000-0 -31515-4 0  9993
2 25545  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236009
";

    fn catalog_file(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_catalog() {
        let file = catalog_file(CATALOG);
        let catalog = load_catalog(file.path(), false).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[1].name, None);
    }

    #[test]
    fn test_select_by_norad_and_name() {
        let file = catalog_file(CATALOG);
        let catalog = load_catalog(file.path(), false).unwrap();

        let vanguard = select(&catalog, &Selector::Norad(5)).unwrap();
        assert_eq!(vanguard.display_name(), "00005");

        let iss = select(&catalog, &Selector::Name("iss (zarya)".to_string())).unwrap();
        assert_eq!(iss.satellite_number(), 25544);

        let partial = select(&catalog, &Selector::Name("deorbit".to_string())).unwrap();
        assert_eq!(partial.satellite_number(), 25545);

        assert_eq!(
            select(&catalog, &Selector::First).unwrap().satellite_number(),
            25544
        );
    }

    #[test]
    fn test_ambiguous_and_missing_names() {
        let file = catalog_file(CATALOG);
        let catalog = load_catalog(file.path(), false).unwrap();

        let err = select(&catalog, &Selector::Name("iss".to_string())).unwrap_err();
        assert!(matches!(err, TrackError::Ambiguous { ref matches, .. } if matches.len() == 2));

        let err = select(&catalog, &Selector::Norad(99999)).unwrap_err();
        assert!(matches!(err, TrackError::NoMatch(_)));
    }

    #[test]
    fn test_lossy_load_skips_bad_records() {
        let corrupted = CATALOG.replace("0  4753", "0  4754");
        let file = catalog_file(&corrupted);

        assert!(matches!(
            load_catalog(file.path(), false),
            Err(TrackError::Catalog(_))
        ));
        let catalog = load_catalog(file.path(), true).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_empty_and_missing_files() {
        let file = catalog_file("\n\n");
        assert!(matches!(
            load_catalog(file.path(), false),
            Err(TrackError::EmptyCatalog(_))
        ));
        assert!(matches!(
            load_catalog(Path::new("/nonexistent/catalog.tle"), false),
            Err(TrackError::Io { .. })
        ));
    }

    #[test]
    fn test_selector_from_args_prefers_norad() {
        assert_eq!(
            Selector::from_args(Some("ISS".into()), Some(25544)),
            Selector::Norad(25544)
        );
        assert_eq!(Selector::from_args(None, None), Selector::First);
    }
}
