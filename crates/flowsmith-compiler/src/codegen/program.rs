//! Program text generation
//!
//! Renders a validated pipeline as DSL2 workflow source. Output depends only
//! on the tree: statements render in stored order and nothing is re-sorted.

use crate::error::RenderError;
use crate::semantic::ValidatedPipeline;
use flowsmith_core::ast::{
    Argument, ChannelChain, EmitItem, NumericValue, Operator, PipelineAst, ProcessCall,
    ProcessDef, Statement, WorkflowDef, MAX_NESTING_DEPTH,
};
use std::fmt::Write;

const INDENT: usize = 4;
const HEADER: &str = "nextflow.enable.dsl=2";

/// Program text renderer
pub struct ProgramRenderer;

impl ProgramRenderer {
    /// Render the whole program
    pub fn render(pipeline: &ValidatedPipeline) -> Result<String, RenderError> {
        let ast = pipeline.ast();
        let mut out = String::new();

        writeln!(out, "{}", HEADER)?;
        writeln!(out)?;

        render_imports(&mut out, ast)?;
        render_globals(&mut out, ast)?;

        if !ast.processes.is_empty() {
            writeln!(out, "// --- INLINE PROCESSES ---")?;
            for process in &ast.processes {
                render_process(&mut out, process)?;
                writeln!(out)?;
            }
        }

        if !ast.sub_workflows.is_empty() {
            writeln!(out, "// --- SUB-WORKFLOWS ---")?;
            for workflow in &ast.sub_workflows {
                render_workflow(&mut out, workflow)?;
                writeln!(out)?;
            }
        }

        writeln!(out, "// --- MAIN WORKFLOW ---")?;
        render_workflow(&mut out, &ast.main_workflow)?;
        writeln!(out)?;

        writeln!(out, "// --- ENTRYPOINT ---")?;
        writeln!(out, "workflow {{")?;
        render_body(&mut out, &ast.entrypoint.body, INDENT, 0)?;
        writeln!(out, "}}")?;

        Ok(tidy(&out))
    }
}

fn render_imports(out: &mut String, ast: &PipelineAst) -> Result<(), RenderError> {
    if ast.imports.is_empty() {
        return Ok(());
    }
    writeln!(out, "// --- IMPORTS ---")?;
    for import in &ast.imports {
        let symbols: Vec<String> = import.functions.iter().map(|s| s.to_string()).collect();
        writeln!(
            out,
            "include {{ {} }} from '{}'",
            symbols.join("; "),
            import.module_path
        )?;
    }
    writeln!(out)?;
    Ok(())
}

fn render_globals(out: &mut String, ast: &PipelineAst) -> Result<(), RenderError> {
    if ast.globals.is_empty() {
        return Ok(());
    }
    writeln!(out, "// --- GLOBALS ---")?;
    for global in &ast.globals {
        writeln!(out, "def {} = {}", global.name, global.value)?;
    }
    writeln!(out)?;
    Ok(())
}

fn render_process(out: &mut String, process: &ProcessDef) -> Result<(), RenderError> {
    writeln!(out, "process {} {{", process.name)?;
    if let Some(container) = &process.container {
        writeln!(out, "    container \"{}\"", container)?;
        writeln!(out)?;
    }

    for (label, declarations) in [
        ("input", &process.input_declarations),
        ("output", &process.output_declarations),
    ] {
        if declarations.is_empty() {
            continue;
        }
        writeln!(out, "    {}:", label)?;
        for declaration in declarations {
            writeln!(out, "        {}", declaration)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "    script:")?;
    writeln!(out, "    \"\"\"")?;
    for line in process.script_block.lines() {
        writeln!(out, "    {}", line)?;
    }
    writeln!(out, "    \"\"\"")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn render_workflow(out: &mut String, workflow: &WorkflowDef) -> Result<(), RenderError> {
    writeln!(out, "workflow {} {{", workflow.name)?;

    if !workflow.take_channels.is_empty() {
        writeln!(out, "    take:")?;
        for input in &workflow.take_channels {
            writeln!(out, "        {}", input)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "    main:")?;
    render_body(out, &workflow.body, INDENT * 2, 0)?;

    if !workflow.emit_channels.is_empty() {
        writeln!(out)?;
        writeln!(out, "    emit:")?;
        for emit in &workflow.emit_channels {
            writeln!(out, "        {}", render_emit(emit))?;
        }
    }

    writeln!(out, "}}")?;
    Ok(())
}

fn render_body(
    out: &mut String,
    body: &[Statement],
    indent: usize,
    depth: usize,
) -> Result<(), RenderError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(RenderError::NestingTooDeep(depth));
    }
    let pad = " ".repeat(indent);

    for statement in body {
        match statement {
            Statement::ProcessCall(call) => writeln!(out, "{}{}", pad, render_call(call))?,
            Statement::ChannelChain(chain) => writeln!(out, "{}{}", pad, render_chain(chain, indent))?,
            Statement::Assignment(assignment) => {
                writeln!(out, "{}{} = {}", pad, assignment.variable, assignment.value)?
            }
            Statement::Conditional(conditional) => {
                writeln!(out, "{}if ({}) {{", pad, conditional.condition)?;
                render_body(out, &conditional.body, indent + INDENT, depth + 1)?;
                writeln!(out, "{}}}", pad)?;
            }
        }
    }
    Ok(())
}

/// Render one call argument
pub fn render_argument(arg: &Argument) -> String {
    match arg {
        Argument::Variable { name } => name.clone(),
        Argument::StringLiteral { value } => {
            format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
        }
        Argument::NumericLiteral { value } => match value {
            NumericValue::Bool(b) => b.to_string(),
            NumericValue::Number(n) => n.to_string(),
        },
    }
}

fn render_call(call: &ProcessCall) -> String {
    let args: Vec<String> = call.args.iter().map(render_argument).collect();
    let mut text = String::new();
    if let Some(binding) = &call.assign_to {
        text.push_str(binding);
        text.push_str(" = ");
    }
    text.push_str(&call.process_name);
    text.push('(');
    text.push_str(&args.join(", "));
    text.push(')');
    if let Some(attribute) = &call.output_attribute {
        if attribute != "*" {
            text.push('.');
            text.push_str(attribute);
        }
    }
    text
}

fn render_operator(operator: &Operator, indent: usize) -> String {
    let mut text = format!(".{}", operator.operator.name());

    if !operator.args.is_empty() {
        text.push('(');
        text.push_str(&operator.args.join(", "));
        text.push(')');
    } else if operator.closure_lines.is_empty() && operator.class().requires_invocation() {
        text.push_str("()");
    }

    if !operator.closure_lines.is_empty() {
        let inner = " ".repeat(indent + INDENT);
        text.push_str(" {\n");
        for line in &operator.closure_lines {
            text.push_str(&inner);
            text.push_str(line.trim_end());
            text.push('\n');
        }
        text.push_str(&" ".repeat(indent));
        text.push('}');
    }
    text
}

fn render_chain(chain: &ChannelChain, indent: usize) -> String {
    let mut text = chain.start_variable.clone();
    for operator in &chain.steps {
        text.push_str(&render_operator(operator, indent));
    }
    if let Some(target) = &chain.set_variable {
        text.push_str(&format!(".set {{ {} }}", target));
    }
    text
}

fn render_emit(emit: &EmitItem) -> String {
    match &emit.internal_variable {
        Some(source) if *source != emit.export_name => {
            format!("{} = {}", emit.export_name, source)
        }
        _ => emit.export_name.clone(),
    }
}

/// Trim trailing whitespace, collapse runs of blank lines and trim the
/// document
fn tidy(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in text.lines() {
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(line);
        previous_blank = blank;
    }
    let mut tidied = lines.join("\n").trim_matches('\n').to_string();
    tidied.push('\n');
    tidied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_rendering() {
        assert_eq!(render_argument(&Argument::variable("reads")), "reads");
        assert_eq!(render_argument(&Argument::string("it's")), "'it\\'s'");
        assert_eq!(render_argument(&Argument::string("a\\b")), "'a\\\\b'");
        assert_eq!(
            render_argument(&Argument::NumericLiteral {
                value: NumericValue::Bool(true)
            }),
            "true"
        );
        assert_eq!(
            render_argument(&Argument::NumericLiteral {
                value: NumericValue::Number(serde_json::Number::from_f64(0.5).unwrap())
            }),
            "0.5"
        );
    }

    #[test]
    fn test_operator_invocation_syntax() {
        use flowsmith_core::ast::OperatorKind;

        let collect = Operator::new(OperatorKind::Collect, vec![], vec![]).unwrap();
        assert_eq!(render_operator(&collect, 4), ".collect()");

        let join = Operator::new(OperatorKind::Join, vec!["other".into(), "by: 0".into()], vec![])
            .unwrap();
        assert_eq!(render_operator(&join, 4), ".join(other, by: 0)");

        let map = Operator::new(OperatorKind::Map, vec![], vec!["it[0]".into()]).unwrap();
        assert_eq!(render_operator(&map, 4), ".map {\n        it[0]\n    }");
    }

    #[test]
    fn test_tidy_collapses_blank_lines() {
        assert_eq!(tidy("\n\na\n\n\n\nb   \n\n"), "a\n\nb   \n");
    }

    #[test]
    fn test_script_block_kept_verbatim() {
        let script = "if [ -s ${bam} ]; then\n  samtools index ${bam}   \n\n\n\tcat log\nfi";
        let process = ProcessDef::new("indexBam", None, vec!["path bam".into()], vec![], script)
            .unwrap();

        let mut out = String::new();
        render_process(&mut out, &process).unwrap();
        let rendered = tidy(&out);

        let expected = "    if [ -s ${bam} ]; then\n      samtools index ${bam}   \n    \n    \n    \tcat log\n    fi\n";
        assert!(rendered.contains(expected), "{}", rendered);
    }
}
