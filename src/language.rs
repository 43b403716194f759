//! Supported interview languages and their editor templates.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CollabError;

/// A language a session can be switched to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Javascript,
    Typescript,
    Python,
    Java,
    Cpp,
}

/// Static per-language settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Human readable name shown in the header and the execution placeholder.
    pub label: &'static str,
    pub extension: &'static str,
    /// Syntax mode handed to the editor widget.
    pub editor_mode: &'static str,
    /// Buffer contents after creation or a language switch.
    pub default_code: &'static str,
}

const JAVASCRIPT_TEMPLATE: &str = "// Welcome to the coding interview!
// Write your solution below

function solution(input) {
  // Your code here
  return input;
}

// Test your solution
console.log(solution(\"Hello, World!\"));";

const TYPESCRIPT_TEMPLATE: &str = "// Welcome to the coding interview!
// Write your solution below

function solution(input: string): string {
  // Your code here
  return input;
}

// Test your solution
console.log(solution(\"Hello, World!\"));";

const PYTHON_TEMPLATE: &str = "# Welcome to the coding interview!
# Write your solution below

def solution(input):
    # Your code here
    return input

# Test your solution
print(solution(\"Hello, World!\"))";

const JAVA_TEMPLATE: &str = "// Welcome to the coding interview!
// Write your solution below

public class Solution {
    public static String solution(String input) {
        // Your code here
        return input;
    }
    
    public static void main(String[] args) {
        System.out.println(solution(\"Hello, World!\"));
    }
}";

const CPP_TEMPLATE: &str = "// Welcome to the coding interview!
// Write your solution below

#include <iostream>
#include <string>
using namespace std;

string solution(string input) {
    // Your code here
    return input;
}

int main() {
    cout << solution(\"Hello, World!\") << endl;
    return 0;
}";

impl Language {
    /// Every supported language, in selector order.
    pub const ALL: [Language; 5] = [
        Language::Javascript,
        Language::Typescript,
        Language::Python,
        Language::Java,
        Language::Cpp,
    ];

    pub fn config(self) -> LanguageConfig {
        match self {
            Language::Javascript => LanguageConfig {
                label: "JavaScript",
                extension: "js",
                editor_mode: "javascript",
                default_code: JAVASCRIPT_TEMPLATE,
            },
            Language::Typescript => LanguageConfig {
                label: "TypeScript",
                extension: "ts",
                editor_mode: "typescript",
                default_code: TYPESCRIPT_TEMPLATE,
            },
            Language::Python => LanguageConfig {
                label: "Python",
                extension: "py",
                editor_mode: "python",
                default_code: PYTHON_TEMPLATE,
            },
            Language::Java => LanguageConfig {
                label: "Java",
                extension: "java",
                editor_mode: "java",
                default_code: JAVA_TEMPLATE,
            },
            Language::Cpp => LanguageConfig {
                label: "C++",
                extension: "cpp",
                editor_mode: "cpp",
                default_code: CPP_TEMPLATE,
            },
        }
    }

    pub fn label(self) -> &'static str {
        self.config().label
    }

    pub fn default_code(self) -> &'static str {
        self.config().default_code
    }

    /// Lowercase key used on the wire and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
        }
    }

    /// Guess a language from a file extension (`"py"`, `".js"`, ...).
    pub fn from_extension(ext: &str) -> Option<Language> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.config().extension == ext)
    }

    /// True for the one language the executor actually evaluates.
    pub fn is_directly_executable(self) -> bool {
        self == Language::Javascript
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Language {
    type Err = CollabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::Javascript),
            "typescript" | "ts" => Ok(Language::Typescript),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "cpp" | "c++" => Ok(Language::Cpp),
            other => Err(CollabError::UnknownLanguage(other.to_string())),
        }
    }
}
