//! Property tests for canonicalization, rendering and node ids
//!
//! Coverage targets:
//! - Canonicalizer idempotence (canonical/)
//! - Program rendering determinism (codegen/program.rs)
//! - Scope soundness (semantic/validator.rs)
//! - Diagram node-id uniqueness (codegen/node_id.rs)

use flowsmith_compiler::{canonicalize, Compiler, NodeIdAllocator};
use flowsmith_core::draft::{
    AssignmentDraft, CallDraft, ChainDraft, ConditionalDraft, EmitDraft, ImportDraft,
    OperatorDraft, PipelineDraft, ProcessDraft, StatementDraft, WorkflowDraft,
};
use flowsmith_core::{Argument, ErrorKind};
use proptest::prelude::*;
use std::collections::HashSet;

const NAMES: &[&str] = &["reads", "bam", "QC", "ALIGN", "step_align", "getSamples", "params.x"];

prop_compose! {
    fn arb_argument()(
        name in prop::sample::select(NAMES.to_vec()),
        literal in "[a-z ]{0,6}",
        quoted in any::<bool>()
    ) -> Argument {
        if quoted { Argument::string(literal) } else { Argument::variable(name) }
    }
}

prop_compose! {
    fn arb_call()(
        process_name in prop::sample::select(vec!["step_align", "QC", "ALIGN", "countReads"]),
        args in prop::collection::vec(arb_argument(), 0..3),
        assign_to in prop::option::of(prop::sample::select(vec!["bam", "qc_out"])),
        output_attribute in prop::option::of(prop::sample::select(vec!["bam", "html", "*"]))
    ) -> StatementDraft {
        StatementDraft::ProcessCall(CallDraft {
            process_name: process_name.to_string(),
            args,
            assign_to: assign_to.map(str::to_string),
            output_attribute: output_attribute.map(str::to_string),
        })
    }
}

prop_compose! {
    fn arb_chain()(
        start in prop::sample::select(vec!["reads", "Channel.of(1, 2)", "bam"]),
        operator in prop::sample::select(vec!["map", "filter", "collect", "join"]),
        set_variable in prop::option::of(prop::sample::select(vec!["pairs", "reads"]))
    ) -> StatementDraft {
        StatementDraft::ChannelChain(ChainDraft {
            start_variable: start.to_string(),
            steps: vec![OperatorDraft {
                operator: operator.to_string(),
                args: vec![],
                closure_lines: vec!["it".to_string()],
            }],
            set_variable: set_variable.map(str::to_string),
        })
    }
}

prop_compose! {
    fn arb_assignment()(
        variable in prop::sample::select(vec!["bam", "ref", "x"]),
        value in prop::sample::select(vec![
            "params.fasta",
            "step_align(reads, 'hg38').bam",
            "getSamples(params.sheet)",
            "file(params.gtf)",
            "bam",
        ])
    ) -> StatementDraft {
        StatementDraft::Assignment(AssignmentDraft {
            variable: variable.to_string(),
            value: value.to_string(),
        })
    }
}

fn arb_statement() -> impl Strategy<Value = StatementDraft> {
    let leaf = prop_oneof![arb_call(), arb_chain(), arb_assignment()];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(|body| {
            StatementDraft::Conditional(ConditionalDraft {
                condition: "params.run".to_string(),
                body,
            })
        })
    })
}

prop_compose! {
    fn arb_emit()(
        export_name in prop::sample::select(vec!["out", "step_A.out", "QC.out.html", "bam"]),
        internal_variable in prop::option::of(prop::sample::select(vec!["bam", "", "ALIGN.out"]))
    ) -> EmitDraft {
        EmitDraft {
            export_name: export_name.to_string(),
            internal_variable: internal_variable.map(str::to_string),
        }
    }
}

prop_compose! {
    fn arb_workflow(name: &'static str)(
        take_channels in prop::collection::vec(prop::sample::select(vec!["reads", "bam"]), 0..2),
        body in prop::collection::vec(arb_statement(), 0..6),
        emit_channels in prop::collection::vec(arb_emit(), 0..3)
    ) -> WorkflowDraft {
        WorkflowDraft {
            name: name.to_string(),
            take_channels: take_channels.into_iter().map(str::to_string).collect(),
            body,
            emit_channels,
        }
    }
}

prop_compose! {
    fn arb_draft()(
        sub_workflows in prop::collection::vec(arb_workflow("QC"), 0..2),
        main_workflow in arb_workflow("MAIN"),
        entrypoint in prop::collection::vec(arb_statement(), 0..3)
    ) -> PipelineDraft {
        PipelineDraft {
            imports: vec![ImportDraft {
                module_path: "../steps/align".to_string(),
                functions: vec!["step_align".to_string()],
            }],
            sub_workflows,
            main_workflow,
            entrypoint: flowsmith_core::draft::EntrypointDraft { body: entrypoint },
            ..Default::default()
        }
    }
}

proptest! {
    #[test]
    fn test_canonicalize_is_idempotent(draft in arb_draft()) {
        let once = canonicalize(draft);
        let twice = canonicalize(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_rendering_is_deterministic(draft in arb_draft()) {
        let compiler = Compiler::new();
        if let Ok(pipeline) = compiler.check(draft) {
            let first = compiler.render(&pipeline).unwrap();
            let second = compiler.render(&pipeline).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn test_check_never_panics(text in ".*") {
        let _ = Compiler::new().check_json(&text);
    }

    /// A reference passes iff its leading name was bound by an input or an
    /// earlier statement, whatever expression wraps it
    #[test]
    fn test_scope_soundness(
        steps in prop::collection::vec(
            (
                prop::sample::select(vec!["a", "b", "c"]),
                prop::sample::select(vec!["reads", "a", "b", "c"]),
                prop::sample::select(vec!["{}.out", "{}[0]", "{} + 1", "{} ?: 'x'", "{}.collect()"]),
                any::<bool>(),
            ),
            1..8,
        )
    ) {
        let mut bound: HashSet<&str> = HashSet::from(["reads"]);
        let mut expected_ok = true;
        for (variable, reference, _, _) in &steps {
            if !bound.contains(reference) {
                expected_ok = false;
                break;
            }
            bound.insert(*variable);
        }

        let draft = PipelineDraft {
            processes: vec![ProcessDraft {
                name: "countReads".to_string(),
                container: None,
                input_declarations: vec!["path x".to_string()],
                output_declarations: vec![],
                script_block: "wc -l $x".to_string(),
            }],
            main_workflow: WorkflowDraft {
                name: "MAIN".to_string(),
                take_channels: vec!["reads".to_string()],
                body: steps
                    .iter()
                    .map(|(variable, reference, shape, as_call)| {
                        let expression = shape.replace("{}", reference);
                        if *as_call {
                            StatementDraft::ProcessCall(CallDraft {
                                process_name: "countReads".to_string(),
                                args: vec![Argument::variable(expression)],
                                assign_to: Some(variable.to_string()),
                                output_attribute: None,
                            })
                        } else {
                            StatementDraft::Assignment(AssignmentDraft {
                                variable: variable.to_string(),
                                value: expression,
                            })
                        }
                    })
                    .collect(),
                emit_channels: vec![],
            },
            ..Default::default()
        };

        match Compiler::new().check(draft) {
            Ok(_) => prop_assert!(expected_ok),
            Err(err) => {
                prop_assert!(!expected_ok, "{}", err);
                prop_assert_eq!(err.kind, ErrorKind::ScopeError);
            }
        }
    }

    #[test]
    fn test_node_ids_unique(names in prop::collection::hash_set("[ -~]{0,40}", 1..40)) {
        let mut ids = NodeIdAllocator::new();
        let allocated: HashSet<String> = names.iter().map(|name| ids.id_for(name)).collect();
        prop_assert_eq!(allocated.len(), names.len());
    }

    #[test]
    fn test_node_ids_are_safe(name in ".{0,60}") {
        let id = NodeIdAllocator::new().id_for(&name);
        prop_assert!(!id.is_empty());
        prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        prop_assert!(!id.starts_with(|c: char| c.is_ascii_digit() || c == '_'));
    }
}
