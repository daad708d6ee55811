use super::{PathPattern, PathPatternError};
use std::sync::Arc;
use tracing::warn;

/// Supplies paths that surrounding routing already treats as public.
pub trait OpenPathSource: Send + Sync {
    fn name(&self) -> &str;
    fn open_paths(&self) -> Vec<String>;
}

/// Health, info and error endpoints that are public in most deployments.
#[derive(Debug, Default)]
pub struct WellKnownOpenPaths;

impl OpenPathSource for WellKnownOpenPaths {
    fn name(&self) -> &str {
        "well-known"
    }

    fn open_paths(&self) -> Vec<String> {
        [
            "/actuator/health/**",
            "/actuator/info",
            "/health/**",
            "/info",
            "/error",
            "/favicon.ico",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }
}

pub enum ExemptionSource {
    Explicit(Vec<String>),
    Inferred(Arc<dyn OpenPathSource>),
}

/// Ordered set of exempt path patterns; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct PathExemptions {
    patterns: Vec<PathPattern>,
}

impl PathExemptions {
    /// Explicit patterns must be valid. Inferred ones are best effort, so bad
    /// entries are skipped with a warning.
    pub fn resolve(sources: &[ExemptionSource]) -> Result<Self, PathPatternError> {
        let mut patterns = Vec::new();

        for source in sources {
            match source {
                ExemptionSource::Explicit(raw) => {
                    for pattern in raw {
                        patterns.push(PathPattern::parse(pattern)?);
                    }
                }
                ExemptionSource::Inferred(open_paths) => {
                    for pattern in open_paths.open_paths() {
                        match PathPattern::parse(&pattern) {
                            Ok(p) => patterns.push(p),
                            Err(e) => warn!(
                                source = open_paths.name(),
                                error = %e,
                                "ignoring inferred open path"
                            ),
                        }
                    }
                }
            }
        }

        patterns.dedup();
        Ok(PathExemptions { patterns })
    }

    /// Configured patterns first, then the well-known open paths if enabled.
    pub fn from_config(excluded_paths: &[String], auto_detect_open_paths: bool) -> Result<Self, PathPatternError> {
        let mut sources = vec![ExemptionSource::Explicit(excluded_paths.to_vec())];
        if auto_detect_open_paths {
            sources.push(ExemptionSource::Inferred(Arc::new(WellKnownOpenPaths)));
        }
        Self::resolve(&sources)
    }

    pub fn matching(&self, path: &str) -> Option<&PathPattern> {
        self.patterns.iter().find(|pattern| pattern.matches(path))
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.matching(path).is_some()
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<&'static str>);

    impl OpenPathSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn open_paths(&self) -> Vec<String> {
            self.0.iter().map(|p| p.to_string()).collect()
        }
    }

    #[test]
    fn first_match_wins_in_source_order() {
        let exemptions = PathExemptions::resolve(&[
            ExemptionSource::Explicit(vec!["/public/*".to_string()]),
            ExemptionSource::Inferred(Arc::new(Fixed(vec!["/public/**"]))),
        ])
        .unwrap();

        assert_eq!(exemptions.matching("/public/a").unwrap().as_str(), "/public/*");
        assert_eq!(exemptions.matching("/public/a/b").unwrap().as_str(), "/public/**");
        assert!(exemptions.matching("/private").is_none());
    }

    #[test]
    fn bad_explicit_pattern_is_an_error() {
        let result = PathExemptions::resolve(&[ExemptionSource::Explicit(vec!["nope".to_string()])]);
        assert!(matches!(result, Err(PathPatternError::NotAbsolute(_))));
    }

    #[test]
    fn bad_inferred_pattern_is_skipped() {
        let exemptions = PathExemptions::resolve(&[ExemptionSource::Inferred(Arc::new(Fixed(vec![
            "nope", "/ok",
        ])))])
        .unwrap();

        assert_eq!(exemptions.patterns().len(), 1);
        assert!(exemptions.is_exempt("/ok"));
    }

    #[test]
    fn well_known_paths_only_when_enabled() {
        let explicit = vec!["/api/v1/health".to_string()];

        let without = PathExemptions::from_config(&explicit, false).unwrap();
        assert!(without.is_exempt("/api/v1/health"));
        assert!(!without.is_exempt("/actuator/health/db"));

        let with = PathExemptions::from_config(&explicit, true).unwrap();
        assert!(with.is_exempt("/actuator/health/db"));
        assert!(with.is_exempt("/favicon.ico"));
        assert!(!with.is_exempt("/api/v1/me"));
    }
}
