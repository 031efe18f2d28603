//! Text catalogs of symptoms, diagnoses and weighted rules
//!
//! A catalog is a line-oriented UTF-8 document with three sections:
//!
//! ```text
//! # comment
//! [symptoms]
//! fever = fever(Patient)
//! cough = cough(Patient)
//!
//! [diagnoses]
//! flu = disease(Patient, Flu)
//!
//! [rules]
//! flu_classic: fever, cough -> flu @ 0.8
//! cough -> flu @ 0.4
//! ```
//!
//! Declarations bind an alias to a predicate literal. A rule line lists
//! antecedent aliases, the consequent alias and a weight, optionally
//! prefixed by an ID (rules without one are named `rule_<line>`).
//!
//! Loading is tolerant: a malformed line, an unknown alias or an invalid
//! weight produces a [`LoadDiagnostic`] and the line is skipped. Only failing
//! to read the file at all is an error.
//!
//! [`Catalog::parse_legacy`] reads the older three-file layout instead: one
//! symptom name per line, one diagnosis name per line (lowercased), and rule
//! lines of the form `sym1,sym2;diagnosis;weight`. Names become zero-argument
//! predicates and double as aliases.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::predicate::Predicate;
use crate::rule::{Rule, RuleSet};

/// A named set of symptom and diagnosis aliases plus the rules built on them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    name: String,
    symptoms: IndexMap<String, Predicate>,
    diagnoses: IndexMap<String, Predicate>,
    rules: RuleSet,
}

/// The result of loading a catalog: the usable part plus any complaints.
#[derive(Debug, Clone)]
pub struct CatalogReport {
    /// Everything that loaded successfully.
    pub catalog: Catalog,
    /// One entry per skipped or suspicious line, in line order.
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl CatalogReport {
    /// Returns `true` when every line loaded cleanly.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// What went wrong on a catalog line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadIssue {
    /// A `[section]` header with an unrecognised name.
    UnknownSection,
    /// A declaration or rule appearing before any section header.
    OutsideSection,
    /// The line does not have the expected shape.
    Malformed,
    /// The predicate literal of a declaration is invalid.
    InvalidPredicate,
    /// An alias was declared twice.
    DuplicateAlias,
    /// A rule refers to an alias that was never declared.
    UnknownAlias,
    /// A rule ID was used twice.
    DuplicateRule,
    /// A rule with an empty antecedent.
    InvalidRule,
    /// A weight that is not a number in `(0, 1]`.
    InvalidWeight,
}

/// A non-fatal problem found while loading a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadDiagnostic {
    /// 1-based line number.
    pub line: usize,
    /// Category of the problem.
    pub issue: LoadIssue,
    /// Human-readable detail.
    pub message: String,
    /// Which input the line came from, when a catalog spans several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{} line {}: {}", origin, self.line, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Symptoms,
    Diagnoses,
    Rules,
    Unknown,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            rules: RuleSet::new(name.clone()),
            name,
            symptoms: IndexMap::new(),
            diagnoses: IndexMap::new(),
        }
    }

    /// Parses catalog text. Never fails; problems end up in the report.
    pub fn parse(name: impl Into<String>, text: &str) -> CatalogReport {
        let mut parser = Parser::new(name.into());
        for (index, line) in text.lines().enumerate() {
            parser.line(index + 1, line);
        }
        parser.finish()
    }

    /// Reads and parses a catalog file. The catalog is named after the file
    /// stem.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<CatalogReport> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(file_stem(path), &text))
    }

    /// Parses the three-file legacy layout: symptom names, diagnosis names
    /// and `;`-separated rule lines. Diagnostics carry the origin
    /// `symptoms`, `diagnoses` or `rules`.
    pub fn parse_legacy(
        name: impl Into<String>,
        symptoms: &str,
        diagnoses: &str,
        rules: &str,
    ) -> CatalogReport {
        Self::legacy(
            name.into(),
            [
                ("symptoms".to_string(), symptoms),
                ("diagnoses".to_string(), diagnoses),
                ("rules".to_string(), rules),
            ],
        )
    }

    /// Reads the three legacy files. The catalog is named after the rules
    /// file stem and diagnostics carry the file path as origin.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if any of the files cannot be read.
    pub fn load_legacy(
        symptoms: impl AsRef<Path>,
        diagnoses: impl AsRef<Path>,
        rules: impl AsRef<Path>,
    ) -> Result<CatalogReport> {
        let paths = [symptoms.as_ref(), diagnoses.as_ref(), rules.as_ref()];
        let texts = [
            std::fs::read_to_string(paths[0])?,
            std::fs::read_to_string(paths[1])?,
            std::fs::read_to_string(paths[2])?,
        ];
        Ok(Self::legacy(
            file_stem(paths[2]),
            [
                (paths[0].display().to_string(), texts[0].as_str()),
                (paths[1].display().to_string(), texts[1].as_str()),
                (paths[2].display().to_string(), texts[2].as_str()),
            ],
        ))
    }

    fn legacy(name: String, [symptoms, diagnoses, rules]: [(String, &str); 3]) -> CatalogReport {
        let mut parser = Parser::new(name);

        for (section, (origin, text)) in [(Section::Symptoms, symptoms), (Section::Diagnoses, diagnoses)] {
            parser.origin = Some(origin);
            for (index, line) in text.lines().enumerate() {
                parser.legacy_declaration(index + 1, section, line);
            }
        }

        let (origin, text) = rules;
        parser.origin = Some(origin);
        for (index, line) in text.lines().enumerate() {
            parser.legacy_rule(index + 1, line);
        }

        parser.finish()
    }

    /// Catalog name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared symptoms by alias.
    pub fn symptoms(&self) -> &IndexMap<String, Predicate> {
        &self.symptoms
    }

    /// Declared diagnoses by alias.
    pub fn diagnoses(&self) -> &IndexMap<String, Predicate> {
        &self.diagnoses
    }

    /// The loaded rules, in file order.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Consumes the catalog, keeping only its rules.
    pub fn into_rules(self) -> RuleSet {
        self.rules
    }

    /// Looks up a symptom alias.
    pub fn symptom(&self, alias: &str) -> Option<&Predicate> {
        self.symptoms.get(alias)
    }

    /// Looks up a diagnosis alias.
    pub fn diagnosis(&self, alias: &str) -> Option<&Predicate> {
        self.diagnoses.get(alias)
    }

    /// Looks up an alias in either table.
    pub fn resolve(&self, alias: &str) -> Option<&Predicate> {
        self.symptom(alias).or_else(|| self.diagnosis(alias))
    }

    /// Turns user input into a fact: a declared alias, or else a predicate
    /// literal such as `fever(Patient)`.
    pub fn resolve_fact(&self, input: &str) -> Result<Predicate> {
        match self.resolve(input.trim()) {
            Some(predicate) => Ok(predicate.clone()),
            None => input.parse(),
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string())
}

struct Parser {
    catalog: Catalog,
    diagnostics: Vec<LoadDiagnostic>,
    section: Section,
    origin: Option<String>,
}

impl Parser {
    fn new(name: String) -> Self {
        Self {
            catalog: Catalog::new(name),
            diagnostics: Vec::new(),
            section: Section::None,
            origin: None,
        }
    }

    fn finish(self) -> CatalogReport {
        info!(
            "Loaded catalog '{}': {} symptoms, {} diagnoses, {} rules, {} diagnostics",
            self.catalog.name,
            self.catalog.symptoms.len(),
            self.catalog.diagnoses.len(),
            self.catalog.rules.len(),
            self.diagnostics.len()
        );
        CatalogReport {
            catalog: self.catalog,
            diagnostics: self.diagnostics,
        }
    }

    fn report(&mut self, line: usize, issue: LoadIssue, message: String) {
        let diagnostic = LoadDiagnostic {
            line,
            issue,
            message,
            origin: self.origin.clone(),
        };
        warn!("Catalog '{}' {}", self.catalog.name, diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn line(&mut self, number: usize, raw: &str) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            self.section = match header.trim().to_ascii_lowercase().as_str() {
                "symptoms" => Section::Symptoms,
                "diagnoses" => Section::Diagnoses,
                "rules" => Section::Rules,
                other => {
                    self.report(
                        number,
                        LoadIssue::UnknownSection,
                        format!("unknown section '{}', its lines are ignored", other),
                    );
                    Section::Unknown
                }
            };
            return;
        }

        match self.section {
            Section::Symptoms | Section::Diagnoses => self.declaration(number, line),
            Section::Rules => self.rule(number, line),
            Section::Unknown => {}
            Section::None => self.report(
                number,
                LoadIssue::OutsideSection,
                "entry before any section header".to_string(),
            ),
        }
    }

    fn declaration(&mut self, number: usize, line: &str) {
        let Some((alias, literal)) = line.split_once('=') else {
            self.report(
                number,
                LoadIssue::Malformed,
                format!("expected 'alias = predicate', got '{}'", line),
            );
            return;
        };

        let alias = alias.trim();
        if !is_alias(alias) {
            self.report(
                number,
                LoadIssue::Malformed,
                format!("invalid alias '{}'", alias),
            );
            return;
        }

        match literal.parse::<Predicate>() {
            Ok(predicate) => self.declare(number, self.section, alias, predicate),
            Err(e) => self.report(number, LoadIssue::InvalidPredicate, e.to_string()),
        }
    }

    fn legacy_declaration(&mut self, number: usize, section: Section, line: &str) {
        let name = line.trim();
        if name.is_empty() {
            return;
        }
        let name = if section == Section::Diagnoses {
            name.to_lowercase()
        } else {
            name.to_string()
        };

        match Predicate::atom(name.as_str()) {
            Ok(predicate) => self.declare(number, section, &name, predicate),
            Err(e) => self.report(number, LoadIssue::InvalidPredicate, e.to_string()),
        }
    }

    fn declare(&mut self, number: usize, section: Section, alias: &str, predicate: Predicate) {
        if self.catalog.resolve(alias).is_some() {
            self.report(
                number,
                LoadIssue::DuplicateAlias,
                format!("alias '{}' is already declared", alias),
            );
            return;
        }

        let table = if section == Section::Symptoms {
            &mut self.catalog.symptoms
        } else {
            &mut self.catalog.diagnoses
        };
        table.insert(alias.to_string(), predicate);
    }

    fn rule(&mut self, number: usize, line: &str) {
        let Some((head, tail)) = line.split_once("->") else {
            self.report(
                number,
                LoadIssue::Malformed,
                format!("expected 'antecedents -> consequent @ weight', got '{}'", line),
            );
            return;
        };

        let (id, antecedents) = match head.split_once(':') {
            Some((id, rest)) if is_alias(id.trim()) => (id.trim().to_string(), rest),
            Some(_) => {
                self.report(number, LoadIssue::Malformed, format!("invalid rule ID in '{}'", line));
                return;
            }
            None => (format!("rule_{}", number), head),
        };

        let Some((consequent, weight)) = tail.split_once('@') else {
            self.report(
                number,
                LoadIssue::Malformed,
                format!("rule '{}' is missing '@ weight'", id),
            );
            return;
        };

        self.add_rule(number, id, antecedents, consequent, weight);
    }

    fn legacy_rule(&mut self, number: usize, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let fields: Vec<&str> = line.split(';').collect();
        let [antecedents, consequent, weight] = fields[..] else {
            self.report(
                number,
                LoadIssue::Malformed,
                format!("expected 'symptoms;diagnosis;weight', got '{}'", line),
            );
            return;
        };

        self.add_rule(number, format!("rule_{}", number), antecedents, consequent, weight);
    }

    fn add_rule(
        &mut self,
        number: usize,
        id: String,
        antecedents: &str,
        consequent: &str,
        weight: &str,
    ) {
        if self.catalog.rules.get(&id).is_some() {
            self.report(
                number,
                LoadIssue::DuplicateRule,
                format!("rule '{}' is already defined", id),
            );
            return;
        }

        let weight = match weight.trim().parse::<f64>() {
            Ok(weight) => weight,
            Err(_) => {
                self.report(
                    number,
                    LoadIssue::InvalidWeight,
                    format!("rule '{}' has a non-numeric weight '{}'", id, weight.trim()),
                );
                return;
            }
        };

        // a blank list is an empty antecedent, left for Rule::new to reject
        let mut antecedent = Vec::new();
        if !antecedents.trim().is_empty() {
            for alias in antecedents.split(',').map(str::trim) {
                if alias.is_empty() {
                    self.report(
                        number,
                        LoadIssue::Malformed,
                        format!("rule '{}' has an empty antecedent entry", id),
                    );
                    return;
                }
                match self.catalog.resolve(alias) {
                    Some(predicate) => antecedent.push(predicate.clone()),
                    None => {
                        self.report(
                            number,
                            LoadIssue::UnknownAlias,
                            format!("rule '{}' references unknown alias '{}'", id, alias),
                        );
                        return;
                    }
                }
            }
        }

        let consequent_alias = consequent.trim();
        let Some(consequent) = self.catalog.resolve(consequent_alias).cloned() else {
            self.report(
                number,
                LoadIssue::UnknownAlias,
                format!("rule '{}' concludes unknown alias '{}'", id, consequent_alias),
            );
            return;
        };

        match Rule::new(id, antecedent, consequent, weight) {
            Ok(rule) => self.catalog.rules.add(rule),
            Err(e) => {
                let issue = match e {
                    Error::InvalidWeight { .. } => LoadIssue::InvalidWeight,
                    _ => LoadIssue::InvalidRule,
                };
                self.report(number, issue, e.to_string());
            }
        }
    }
}

fn is_alias(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sample catalog
[symptoms]
fever = fever(Patient)
cough = cough(Patient)
sore_throat = sore_throat(Patient)

[diagnoses]
flu = disease(Patient, Flu)
cold = disease(Patient, Common Cold)

[rules]
flu_classic: fever, cough, sore_throat -> flu @ 0.8
cough, sore_throat -> cold @ 0.5
";

    #[test]
    fn test_parse_clean_catalog() {
        let report = Catalog::parse("sample", SAMPLE);
        assert!(report.is_clean(), "{:?}", report.diagnostics);

        let catalog = report.catalog;
        assert_eq!(catalog.name(), "sample");
        assert_eq!(catalog.symptoms().len(), 3);
        assert_eq!(catalog.diagnoses().len(), 2);
        assert_eq!(catalog.rules().len(), 2);

        let flu = catalog.rules().get("flu_classic").unwrap();
        assert_eq!(flu.antecedent().len(), 3);
        assert_eq!(flu.consequent().to_string(), "disease(Patient, Flu)");
        assert_eq!(flu.weight(), 0.8);

        // unnamed rules are named after their line
        assert!(catalog.rules().get("rule_13").is_some());
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let text = "\
[symptoms]
fever = fever(Patient)
fever = fever(Other)
broken line
odd = odd(
[diagnoses]
flu = disease(Patient, Flu)
[rules]
ok: fever -> flu @ 0.7
unknown: fever, headache -> flu @ 0.7
heavy: fever -> flu @ 1.5
nan: fever -> flu @ abc
empty: -> flu @ 0.5
noweight: fever -> flu
ok: fever -> flu @ 0.3
";
        let report = Catalog::parse("bad", text);
        let issues: Vec<_> = report.diagnostics.iter().map(|d| (d.line, d.issue)).collect();
        assert_eq!(
            issues,
            [
                (3, LoadIssue::DuplicateAlias),
                (4, LoadIssue::Malformed),
                (5, LoadIssue::InvalidPredicate),
                (10, LoadIssue::UnknownAlias),
                (11, LoadIssue::InvalidWeight),
                (12, LoadIssue::InvalidWeight),
                (13, LoadIssue::InvalidRule),
                (14, LoadIssue::Malformed),
                (15, LoadIssue::DuplicateRule),
            ]
        );

        let rules = report.catalog.rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get("ok").unwrap().weight(), 0.7);
    }

    #[test]
    fn test_unknown_and_missing_sections() {
        let text = "\
stray = stray(Patient)
[signs]
ignored = ignored(Patient)
[symptoms]
fever = fever(Patient)
";
        let report = Catalog::parse("sections", text);
        let issues: Vec<_> = report.diagnostics.iter().map(|d| d.issue).collect();
        assert_eq!(issues, [LoadIssue::OutsideSection, LoadIssue::UnknownSection]);
        assert_eq!(report.catalog.symptoms().len(), 1);
    }

    #[test]
    fn test_empty_antecedent_entry_is_malformed() {
        let text = "\
[symptoms]
fever = fever(Patient)
cough = cough(Patient)
[diagnoses]
flu = disease(Patient, Flu)
[rules]
fever, , cough -> flu @ 0.8
fever, cough, -> flu @ 0.8
fever, cough -> flu @ 0.8
";
        let report = Catalog::parse("gaps", text);
        let issues: Vec<_> = report.diagnostics.iter().map(|d| (d.line, d.issue)).collect();
        assert_eq!(issues, [(7, LoadIssue::Malformed), (8, LoadIssue::Malformed)]);

        let rules = report.catalog.rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get("rule_9").unwrap().antecedent().len(), 2);
    }

    #[test]
    fn test_parse_legacy() {
        let symptoms = "febre\ntosse\n\ndor_de_cabeca\ntosse\n";
        let diagnoses = "Gripe\nResfriado\n";
        let rules = "\
febre,tosse;gripe;0.8
tosse ; resfriado ; 0.5
febre;Gripe;0.7
febre;gripe
febre,calafrio;gripe;0.6
febre;gripe;abc
febre,,tosse;gripe;0.4
";
        let report = Catalog::parse_legacy("legacy", symptoms, diagnoses, rules);
        let catalog = &report.catalog;

        assert_eq!(catalog.symptoms().len(), 3);
        let diagnoses: Vec<_> = catalog.diagnoses().keys().map(String::as_str).collect();
        assert_eq!(diagnoses, ["gripe", "resfriado"]);

        let rule = catalog.rules().get("rule_1").unwrap();
        assert_eq!(
            rule.antecedent(),
            [Predicate::atom("febre").unwrap(), Predicate::atom("tosse").unwrap()]
        );
        assert_eq!(rule.consequent(), &Predicate::atom("gripe").unwrap());
        assert_eq!(rule.weight(), 0.8);
        assert_eq!(catalog.rules().get("rule_2").unwrap().weight(), 0.5);
        assert_eq!(catalog.rules().len(), 2);

        let issues: Vec<_> = report
            .diagnostics
            .iter()
            .map(|d| (d.origin.as_deref(), d.line, d.issue))
            .collect();
        assert_eq!(
            issues,
            [
                (Some("symptoms"), 5, LoadIssue::DuplicateAlias),
                (Some("rules"), 3, LoadIssue::UnknownAlias),
                (Some("rules"), 4, LoadIssue::Malformed),
                (Some("rules"), 5, LoadIssue::UnknownAlias),
                (Some("rules"), 6, LoadIssue::InvalidWeight),
                (Some("rules"), 7, LoadIssue::Malformed),
            ]
        );
        assert!(report.diagnostics[2].to_string().starts_with("rules line 4: "));
    }

    #[test]
    fn test_diagnostic_display_without_origin() {
        let report = Catalog::parse("x", "stray = stray(Patient)\n");
        assert_eq!(report.diagnostics[0].origin, None);
        assert_eq!(
            report.diagnostics[0].to_string(),
            "line 1: entry before any section header"
        );
    }

    #[test]
    fn test_resolve_fact() {
        let catalog = Catalog::parse("sample", SAMPLE).catalog;
        assert_eq!(
            catalog.resolve_fact("fever").unwrap(),
            Predicate::new("fever", ["Patient"]).unwrap()
        );
        assert_eq!(
            catalog.resolve_fact("rash(Patient)").unwrap(),
            Predicate::new("rash", ["Patient"]).unwrap()
        );
        assert!(catalog.resolve_fact("rash(").is_err());
        assert!(catalog.resolve("flu").is_some());
        assert!(catalog.symptom("flu").is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load("/nonexistent/dir/catalog.txt").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
