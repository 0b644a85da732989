//! Task descriptors and the task generator.
//!
//! Every [`Task`] shares one [`InvocationTemplate`] (binary path plus the
//! fixed arguments) and adds exactly one parameter value, which always goes
//! last on the command line.

use std::fmt;
use std::sync::Arc;

use crate::sweep::range::{format_value, SweepRange, SweepValues};

/// Placeholder substituted with the task's parameter in output path templates.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// The part of the command line shared by every task in a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationTemplate {
    program: String,
    fixed_args: Vec<String>,
    output_path_template: Option<String>,
}

impl InvocationTemplate {
    /// Creates a template for `program` followed by `fixed_args` in order.
    pub fn new(program: impl Into<String>, fixed_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            fixed_args,
            output_path_template: None,
        }
    }

    /// Sets a per-task output path template containing [`VALUE_PLACEHOLDER`].
    pub fn with_output_path_template(mut self, template: Option<String>) -> Self {
        self.output_path_template = template;
        self
    }

    /// Path of the external binary.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Fixed arguments placed between the program and the parameter.
    pub fn fixed_args(&self) -> &[String] {
        &self.fixed_args
    }

    /// The configured output path template, if any.
    pub fn output_path_template(&self) -> Option<&str> {
        self.output_path_template.as_deref()
    }
}

/// One unit of work: a single sweep value bound to the shared invocation.
#[derive(Debug, Clone)]
pub struct Task {
    index: u64,
    value: f64,
    param: String,
    template: Arc<InvocationTemplate>,
}

impl Task {
    /// Creates the task for `value`, emitted at position `index`.
    pub fn new(index: u64, value: f64, template: Arc<InvocationTemplate>) -> Self {
        Self {
            index,
            value,
            param: format_value(value),
            template,
        }
    }

    /// Zero-based emission order of this task within its sweep.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The raw sweep value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The sweep value as passed on the command line.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Path of the external binary.
    pub fn program(&self) -> &str {
        self.template.program()
    }

    /// Arguments after the program: the fixed arguments, then the parameter.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.template
            .fixed_args()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.param.as_str()))
    }

    /// The full argument vector, program first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program())
            .chain(self.args())
            .map(str::to_owned)
            .collect()
    }

    /// Output path for this task, when the sweep namespaces outputs per value.
    pub fn output_path(&self) -> Option<String> {
        self.template
            .output_path_template()
            .map(|t| t.replace(VALUE_PLACEHOLDER, &self.param))
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.argv())
    }
}

/// Lazily turns the values of a [`SweepRange`] into [`Task`]s.
///
/// Nothing is materialized up front; each call to `next` builds one task.
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    values: SweepValues,
    next_index: u64,
    template: Arc<InvocationTemplate>,
}

impl TaskGenerator {
    /// Creates a generator over `range` sharing `template` across all tasks.
    pub fn new(range: &SweepRange, template: Arc<InvocationTemplate>) -> Self {
        Self {
            values: range.iter(),
            next_index: 0,
            template,
        }
    }
}

impl Iterator for TaskGenerator {
    type Item = Task;

    fn next(&mut self) -> Option<Task> {
        let value = self.values.next()?;
        let task = Task::new(self.next_index, value, self.template.clone());
        self.next_index += 1;
        Some(task)
    }
}

impl std::iter::FusedIterator for TaskGenerator {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn template() -> Arc<InvocationTemplate> {
        Arc::new(InvocationTemplate::new(
            "./main.out",
            vec![
                "wordToClassCount.mtx".to_string(),
                "../vocabulary.txt".to_string(),
                "../newsgrouplabels.txt".to_string(),
                "customTest.csv".to_string(),
            ],
        ))
    }

    #[test]
    fn test_argv_order() {
        let task = Task::new(0, 0.00001, template());
        assert_eq!(
            task.argv(),
            vec![
                "./main.out",
                "wordToClassCount.mtx",
                "../vocabulary.txt",
                "../newsgrouplabels.txt",
                "customTest.csv",
                "0.00001",
            ]
        );
        assert_eq!(task.args().last(), Some("0.00001"));
    }

    #[test]
    fn test_generator_params_follow_sweep_order() {
        let range = SweepRange::new(0.1, 0.3, 0.1);
        let tasks: Vec<Task> = TaskGenerator::new(&range, template()).collect();
        let params: Vec<&str> = tasks.iter().map(Task::param).collect();
        assert_eq!(params, vec!["0.1", "0.2"]);
        let indices: Vec<u64> = tasks.iter().map(Task::index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_generator_shares_prefix() {
        let range = SweepRange::new(0.0, 1.0, 0.25);
        let fixed = template();
        for task in TaskGenerator::new(&range, fixed.clone()) {
            let argv = task.argv();
            assert_eq!(argv.len(), fixed.fixed_args().len() + 2);
            assert_eq!(argv[0], fixed.program());
            assert_eq!(&argv[1..argv.len() - 1], fixed.fixed_args());
            assert_eq!(argv[argv.len() - 1], task.param());
        }
    }

    #[test]
    fn test_empty_range_yields_no_tasks() {
        let range = SweepRange::new(1.0, 0.0, 0.1);
        assert_eq!(TaskGenerator::new(&range, template()).count(), 0);
    }

    #[test]
    fn test_output_path_substitution() {
        let template = InvocationTemplate::new("bin", vec![])
            .with_output_path_template(Some("out/result-{value}.txt".to_string()));
        let task = Task::new(3, 0.5, Arc::new(template));
        assert_eq!(task.output_path().as_deref(), Some("out/result-0.5.txt"));
    }

    #[test]
    fn test_no_output_path_by_default() {
        let task = Task::new(0, 0.5, template());
        assert!(task.output_path().is_none());
    }

    #[test]
    fn test_display_lists_argv() {
        let task = Task::new(0, 0.5, Arc::new(InvocationTemplate::new("bin", vec!["a".into()])));
        assert_eq!(task.to_string(), r#"["bin", "a", "0.5"]"#);
    }
}
