/// Library names an agent's generated code is allowed to import.
///
/// An entry matches the module itself; an entry ending in `.*` also matches
/// every submodule, and a lone `*` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportAllowList {
    modules: Vec<String>,
}

impl ImportAllowList {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.extend(modules);
        list
    }

    pub fn extend<I, S>(&mut self, modules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for module in modules {
            let module = module.into().trim().to_string();
            if !module.is_empty() && !self.modules.contains(&module) {
                self.modules.push(module);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Whether generated code may import `module`. Hosts that execute agent
    /// code check each import against this before running it.
    pub fn is_authorized(&self, module: &str) -> bool {
        self.modules.iter().any(|entry| {
            if entry == "*" || entry == module {
                return true;
            }
            match entry.strip_suffix(".*") {
                Some(prefix) => {
                    module == prefix
                        || module
                            .strip_prefix(prefix)
                            .is_some_and(|rest| rest.starts_with('.'))
                }
                None => false,
            }
        })
    }

    /// Comma-separated list for prompts
    pub fn render(&self) -> String {
        if self.modules.is_empty() {
            "(none)".to_string()
        } else {
            self.modules.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_entries_do_not_cover_submodules() {
        let list = ImportAllowList::new(["selenium", "selenium.webdriver.common.by"]);
        assert!(list.is_authorized("selenium"));
        assert!(list.is_authorized("selenium.webdriver.common.by"));
        assert!(!list.is_authorized("selenium.webdriver.common.keys"));
        assert!(!list.is_authorized("subprocess"));
    }

    #[test]
    fn wildcard_entries_cover_submodules() {
        let list = ImportAllowList::new(["numpy.*"]);
        assert!(list.is_authorized("numpy"));
        assert!(list.is_authorized("numpy.linalg"));
        assert!(!list.is_authorized("numpyx"));
    }

    #[test]
    fn star_allows_everything() {
        assert!(ImportAllowList::new(["*"]).is_authorized("anything.at.all"));
    }

    #[test]
    fn duplicates_and_blanks_are_dropped() {
        let list = ImportAllowList::new(["json", " json ", "", "os"]);
        assert_eq!(list.modules(), ["json", "os"]);
        assert_eq!(list.render(), "json, os");
        assert_eq!(ImportAllowList::default().render(), "(none)");
    }
}
