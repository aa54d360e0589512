//! Language catalog
//!
//! Static, ordered registry of the languages the editor supports together
//! with the snippet a fresh buffer starts from.

use serde::Serialize;

use crate::error::{CodeChatError, Result};

/// A supported editor language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    /// Unique key, also used as the persisted `selectedLanguage` value
    pub id: &'static str,
    /// Human readable label
    pub display_name: &'static str,
    /// Snippet a fresh buffer starts from
    pub default_code: &'static str,
}

const BUILTIN_LANGUAGES: &[LanguageOption] = &[
    LanguageOption {
        id: "javascript",
        display_name: "JavaScript",
        default_code: "console.log('Hello World');",
    },
    LanguageOption {
        id: "typescript",
        display_name: "TypeScript",
        default_code: "console.log('Hello TypeScript');",
    },
    LanguageOption {
        id: "python",
        display_name: "Python",
        default_code: "print('Hello World')",
    },
    LanguageOption {
        id: "java",
        display_name: "Java",
        default_code: "public class Main {\n  public static void main(String[] args) {\n    System.out.println(\"Hello World\");\n  }\n}",
    },
    LanguageOption {
        id: "cpp",
        display_name: "C++",
        default_code: "#include <iostream>\nint main() {\n  std::cout << \"Hello World\";\n  return 0;\n}",
    },
    LanguageOption {
        id: "c",
        display_name: "C",
        default_code: "#include <stdio.h>\nint main() {\n  printf(\"Hello World\");\n  return 0;\n}",
    },
    LanguageOption {
        id: "csharp",
        display_name: "C#",
        default_code: "using System;\nclass Program {\n  static void Main() {\n    Console.WriteLine(\"Hello World\");\n  }\n}",
    },
    LanguageOption {
        id: "go",
        display_name: "Go",
        default_code: "package main\nimport \"fmt\"\nfunc main() {\n  fmt.Println(\"Hello World\")\n}",
    },
    LanguageOption {
        id: "swift",
        display_name: "Swift",
        default_code: "print(\"Hello World\")",
    },
    LanguageOption {
        id: "html",
        display_name: "HTML",
        default_code: "<!DOCTYPE html>\n<html>\n<body>\n  <h1>Hello World</h1>\n</body>\n</html>",
    },
    LanguageOption {
        id: "css",
        display_name: "CSS",
        default_code: "body {\n  background: #1a1a2e;\n  color: white;\n}",
    },
];

/// Ordered, immutable set of [`LanguageOption`]s
///
/// # Examples
///
/// ```
/// use codechat::catalog::LanguageCatalog;
///
/// let catalog = LanguageCatalog::builtin();
/// let python = catalog.lookup("python").unwrap();
/// assert_eq!(python.default_code, "print('Hello World')");
/// assert!(catalog.lookup("cobol").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    languages: Vec<LanguageOption>,
}

impl LanguageCatalog {
    /// The catalog shipped with the workspace
    pub fn builtin() -> Self {
        Self {
            languages: BUILTIN_LANGUAGES.to_vec(),
        }
    }

    /// Build a catalog from an explicit list
    ///
    /// # Errors
    ///
    /// Returns `CodeChatError::Config` if the list is empty or contains
    /// duplicate ids.
    pub fn from_options(languages: Vec<LanguageOption>) -> Result<Self> {
        if languages.is_empty() {
            return Err(CodeChatError::Config("language catalog cannot be empty".into()).into());
        }
        for (i, lang) in languages.iter().enumerate() {
            if languages[..i].iter().any(|l| l.id == lang.id) {
                return Err(CodeChatError::Config(format!(
                    "duplicate language id in catalog: {}",
                    lang.id
                ))
                .into());
            }
        }
        Ok(Self { languages })
    }

    /// Resolve a language by id
    ///
    /// # Errors
    ///
    /// Returns `CodeChatError::UnknownLanguage` if `id` is not in the catalog.
    pub fn lookup(&self, id: &str) -> Result<&LanguageOption> {
        self.languages
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| CodeChatError::UnknownLanguage(id.to_string()).into())
    }

    /// All languages in catalog order
    pub fn list(&self) -> &[LanguageOption] {
        &self.languages
    }

    /// The language a fresh workspace starts with
    pub fn first(&self) -> &LanguageOption {
        // from_options and builtin never produce an empty catalog
        &self.languages[0]
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
