/// Keyword-indexed suggestions used when live discovery yields nothing.
/// Entries are checked in order; the first keyword found in the query wins.
#[derive(Debug, Clone)]
pub struct FallbackTable {
    entries: Vec<(String, Vec<String>)>,
    default_tools: Vec<String>,
}

impl FallbackTable {
    pub fn new(entries: Vec<(String, Vec<String>)>, default_tools: Vec<String>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(keyword, tools)| (keyword.to_lowercase(), tools))
            .collect();
        Self { entries, default_tools }
    }

    /// Tools for the first keyword contained in `query`, case-insensitively.
    pub fn lookup(&self, query: &str) -> Option<&[String]> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| query.contains(keyword.as_str()))
            .map(|(_, tools)| tools.as_slice())
    }

    /// Like [`lookup`](Self::lookup) but never empty-handed.
    pub fn suggest(&self, query: &str) -> Vec<String> {
        self.lookup(query)
            .unwrap_or(self.default_tools.as_slice())
            .to_vec()
    }
}

impl Default for FallbackTable {
    fn default() -> Self {
        fn entry(keyword: &str, tools: &[&str]) -> (String, Vec<String>) {
            (keyword.to_string(), tools.iter().map(|t| t.to_string()).collect())
        }

        Self::new(
            vec![
                entry("database", &["Supabase", "PlanetScale", "Neon", "Firebase"]),
                entry("react", &["Redux", "Zustand", "Jotai", "Recoil"]),
                entry("state management", &["Redux", "Zustand", "Jotai", "MobX"]),
                entry("python", &["FastAPI", "Django", "Flask"]),
                entry("web framework", &["Express", "FastAPI", "Django", "Rails"]),
                entry("ci/cd", &["GitHub Actions", "GitLab CI", "CircleCI", "Jenkins"]),
                entry("backend", &["Firebase", "Supabase", "Appwrite", "PocketBase"]),
                entry("hosting", &["Vercel", "Netlify", "Railway", "Render"]),
                entry("monitoring", &["Sentry", "Datadog", "Grafana"]),
            ],
            vec!["GitHub".to_string(), "Vercel".to_string(), "Docker".to_string()],
        )
    }
}
