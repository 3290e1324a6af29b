use cminus::codegen::{Opcode, Quadruple};
use cminus::parser::{Diagnostic, ParseOutcome, Verdict};

fn compile(source: &str) -> ParseOutcome {
    cminus::compile(source)
}

fn assert_accepts(source: &str) -> ParseOutcome {
    let outcome = compile(source);
    assert_eq!(
        outcome.verdict,
        Verdict::Accept,
        "diagnostics: {:?}",
        outcome.diagnostics
    );
    outcome
}

fn assert_rejects(source: &str) -> ParseOutcome {
    let outcome = compile(source);
    assert_eq!(outcome.verdict, Verdict::Reject);
    outcome
}

fn find(quads: &[Quadruple], opcode: Opcode) -> &Quadruple {
    quads
        .iter()
        .find(|q| q.opcode == opcode)
        .unwrap_or_else(|| panic!("no {:?} quadruple in {:#?}", opcode, quads))
}

#[test]
fn minimal_program_accepts() {
    assert_accepts("int main(void) { return 0; }");
}

#[test]
fn missing_main_rejects_naming_main() {
    let outcome = assert_rejects("int start(void) { return 0; }");
    assert!(outcome.diagnostics.contains(&Diagnostic::MainUndefined));
}

#[test]
fn main_with_parameters_does_not_count() {
    let outcome = assert_rejects("int main(int argc) { return 0; }");
    assert!(outcome.diagnostics.contains(&Diagnostic::MainUndefined));
}

#[test]
fn duplicate_declaration_in_one_scope_rejects() {
    let outcome = assert_rejects(
        "int main(void) {
            int x;
            int x;
            return 0;
        }",
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::DuplicateSymbol("x".to_string())));
}

#[test]
fn shadowing_in_a_nested_block_is_legal() {
    assert_accepts(
        "int main(void) {
            int x;
            x = 1;
            {
                int x;
                x = 2;
            }
            return 0;
        }",
    );
}

#[test]
fn undeclared_identifier_rejects() {
    let outcome = assert_rejects("int main(void) { x = 1; return 0; }");
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::UndeclaredIdentifier("x".to_string())));
}

#[test]
fn void_variable_rejects() {
    let outcome = assert_rejects("int main(void) { void v; return 0; }");
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::VoidVariable("v".to_string())));
}

#[test]
fn named_void_parameter_rejects() {
    let outcome = assert_rejects(
        "void f(void x) { ; }
         int main(void) { return 0; }",
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::NamedVoidParameter("x".to_string())));
}

#[test]
fn func_quadruple_carries_backpatched_param_count() {
    let outcome = assert_accepts(
        "int add(int a, int b) { return a + b; }
         int main(void) { return 0; }",
    );
    let funcs: Vec<_> = outcome
        .quadruples
        .iter()
        .filter(|q| q.opcode == Opcode::Func)
        .collect();
    assert_eq!(funcs.len(), 2);
    assert_eq!(funcs[0].operand1, "add");
    assert_eq!(funcs[0].result, "2");
    assert_eq!(funcs[1].operand1, "main");
    assert_eq!(funcs[1].result, "0");
}

#[test]
fn each_parameter_emits_param_then_alloc() {
    let outcome = assert_accepts(
        "int add(int a, int b) { return a + b; }
         int main(void) { return 0; }",
    );
    let quads = &outcome.quadruples;
    let param = find(quads, Opcode::Param);
    assert_eq!(param.result, "a");
    let alloc = &quads[param.index]; // quad right after, indices are 1-based
    assert_eq!(alloc.opcode, Opcode::Alloc);
    assert_eq!(alloc.operand1, "4");
    assert_eq!(alloc.result, "a");
}

#[test]
fn branch_free_program_emits_no_branches() {
    let outcome = assert_accepts(
        "int main(void) {
            int x;
            x = 1 + 2 * 3;
            return x;
        }",
    );
    assert!(!outcome.quadruples.iter().any(|q| q.opcode.is_branch()));
}

#[test]
fn arithmetic_uses_fresh_temporaries() {
    let outcome = assert_accepts(
        "int main(void) {
            int x;
            x = 1 + 2 * 3;
            return x;
        }",
    );
    let quads = &outcome.quadruples;
    let mult = find(quads, Opcode::Mult);
    assert_eq!((mult.operand1.as_str(), mult.operand2.as_str()), ("2", "3"));
    let add = find(quads, Opcode::Add);
    assert_eq!(add.operand1, "1");
    assert_eq!(add.operand2, mult.result);
    let assign = find(quads, Opcode::Assign);
    assert_eq!(assign.operand1, add.result);
    assert_eq!(assign.result, "x");
}

#[test]
fn if_branch_is_patched_past_the_block() {
    let outcome = assert_accepts(
        "int main(void) {
            int a;
            int b;
            int x;
            a = 1;
            b = 2;
            if (a < b) { x = 1; }
            return 0;
        }",
    );
    let quads = &outcome.quadruples;

    let comp = find(quads, Opcode::Comp);
    assert_eq!(comp.operand1, "a");
    assert_eq!(comp.operand2, "<");

    // the branch is the inverse of `<` and its target is filled in, one past
    // the last quadruple of the block
    let branch = find(quads, Opcode::Brgeq);
    assert_eq!(branch.index, comp.index + 1);
    assert_eq!(branch.operand1, comp.result);
    let end_block = find(quads, Opcode::EndBlock);
    assert_eq!(branch.result, (end_block.index + 1).to_string());
}

#[test]
fn while_branch_is_patched_past_the_body() {
    let outcome = assert_accepts(
        "int main(void) {
            int i;
            i = 0;
            while (i < 10) {
                i = i + 1;
            }
            return 0;
        }",
    );
    let quads = &outcome.quadruples;
    let branch = find(quads, Opcode::Brgeq);
    let end_block = find(quads, Opcode::EndBlock);
    assert_eq!(branch.result, (end_block.index + 1).to_string());
}

#[test]
fn each_relational_operator_branches_with_its_inverse() {
    let cases = [
        ("<=", Opcode::Brgt),
        ("<", Opcode::Brgeq),
        (">", Opcode::Brleq),
        (">=", Opcode::Brlt),
        ("==", Opcode::Brneq),
        ("!=", Opcode::Breq),
    ];
    for (op, branch) in cases {
        let source = format!(
            "int main(void) {{
                int a;
                a = 1;
                if (a {} 2) {{ a = 0; }}
                return 0;
            }}",
            op
        );
        let outcome = assert_accepts(&source);
        find(&outcome.quadruples, branch);
    }
}

#[test]
fn arity_mismatch_rejects_but_still_emits_the_call() {
    let outcome = assert_rejects(
        "int inc(int n) { return n + 1; }
         int main(void) {
            int x;
            x = inc(1, 2);
            return x;
         }",
    );
    assert!(outcome.diagnostics.contains(&Diagnostic::ArgumentCountMismatch {
        callee: "inc".to_string(),
        found: 2,
        expected: 1,
    }));

    let quads = &outcome.quadruples;
    let args: Vec<_> = quads.iter().filter(|q| q.opcode == Opcode::Arg).collect();
    assert_eq!(args.len(), 2);
    assert_eq!(args[0].result, "1");
    assert_eq!(args[1].result, "2");

    let call = find(quads, Opcode::Call);
    assert_eq!(call.operand1, "inc");
    assert_eq!(call.operand2, "2");
}

#[test]
fn argument_type_mismatch_rejects() {
    let outcome = assert_rejects(
        "int inc(int n) { return n + 1; }
         int main(void) {
            int x;
            x = inc(1.5);
            return x;
         }",
    );
    assert!(outcome.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::ArgumentTypeMismatch { callee, index: 0, .. } if callee == "inc"
    )));
}

#[test]
fn array_alloc_size_and_displacement_before_assign() {
    let outcome = assert_accepts(
        "int main(void) {
            int a[10];
            a[3] = 5;
            return 0;
        }",
    );
    let quads = &outcome.quadruples;

    let alloc = quads
        .iter()
        .find(|q| q.opcode == Opcode::Alloc && q.result == "a")
        .unwrap();
    assert_eq!(alloc.operand1, "40");

    let disp = find(quads, Opcode::Disp);
    assert_eq!(disp.operand1, "a");
    assert_eq!(disp.operand2, "4");

    let assign = find(quads, Opcode::Assign);
    assert!(disp.index < assign.index);
    assert_eq!(assign.operand1, "5");
    assert_eq!(assign.result, disp.result);
}

#[test]
fn huge_array_bound_is_accepted_and_sized() {
    // bounds are parsed, never validated
    let outcome = assert_accepts(
        "int main(void) {
            int a[2000000000];
            return 0;
        }",
    );
    let alloc = outcome
        .quadruples
        .iter()
        .find(|q| q.opcode == Opcode::Alloc && q.result == "a")
        .unwrap();
    assert_eq!(alloc.operand1, "8000000000");
}

#[test]
fn array_bound_beyond_integer_range_rejects() {
    let outcome = assert_rejects(
        "int main(void) {
            int a[99999999999999999999];
            return 0;
        }",
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::IntegerOutOfRange(
            "99999999999999999999".to_string()
        )));
}

#[test]
fn non_int_array_index_rejects() {
    let outcome = assert_rejects(
        "int main(void) {
            int a[10];
            a[1.5] = 0;
            return 0;
        }",
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::ArrayIndexNotInt("float".to_string())));
}

#[test]
fn indexing_a_scalar_rejects() {
    let outcome = assert_rejects(
        "int main(void) {
            int x;
            x[0] = 1;
            return 0;
        }",
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::IndexedScalar("x".to_string())));
}

#[test]
fn assignment_type_mismatch_rejects() {
    let outcome = assert_rejects(
        "int main(void) {
            int x;
            float y;
            y = 1.5;
            x = y;
            return 0;
        }",
    );
    assert!(outcome.diagnostics.contains(&Diagnostic::AssignmentTypeMismatch {
        expected: "int".to_string(),
        found: "float".to_string(),
    }));
}

#[test]
fn operand_type_mismatch_names_the_production() {
    let outcome = assert_rejects(
        "int main(void) {
            int x;
            float y;
            y = 1.5;
            x = x + y;
            return 0;
        }",
    );
    assert!(outcome.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::OperandTypeMismatch { production: "additive-expr", .. }
    )));
}

#[test]
fn return_type_mismatch_rejects() {
    let outcome = assert_rejects("int main(void) { return 1.5; }");
    assert!(outcome.diagnostics.contains(&Diagnostic::ReturnTypeMismatch {
        expected: "int".to_string(),
        found: "float".to_string(),
    }));
}

#[test]
fn void_function_returning_a_value_rejects() {
    let outcome = assert_rejects(
        "void f(void) { return 1; }
         int main(void) { return 0; }",
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::VoidFunctionReturnsValue));
}

#[test]
fn calling_a_variable_rejects() {
    let outcome = assert_rejects(
        "int main(void) {
            int x;
            x = x(1);
            return 0;
        }",
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::NotAFunction("x".to_string())));
}

#[test]
fn using_a_function_as_a_variable_rejects() {
    let outcome = assert_rejects(
        "int f(void) { return 0; }
         int main(void) {
            int x;
            x = f + 1;
            return 0;
        }",
    );
    assert!(outcome
        .diagnostics
        .contains(&Diagnostic::NotAVariable("f".to_string())));
}

#[test]
fn comparison_outside_a_conditional_patches_its_branch() {
    let outcome = assert_accepts(
        "int main(void) {
            int x;
            int a;
            int b;
            a = 1;
            b = 2;
            x = a < b;
            return x;
        }",
    );
    let quads = &outcome.quadruples;

    // the branch jumps just past the assignment statement, never to the
    // placeholder index 0
    assert!(!quads
        .iter()
        .any(|q| q.opcode.is_branch() && q.result == "0"));
    let branch = find(quads, Opcode::Brgeq);
    let assign = quads
        .iter()
        .find(|q| q.opcode == Opcode::Assign && q.result == "x")
        .unwrap();
    assert_eq!(branch.result, (assign.index + 1).to_string());
}

#[test]
fn nested_compound_statements_emit_block_markers() {
    let outcome = assert_accepts(
        "int main(void) {
            { ; }
            return 0;
        }",
    );
    let quads = &outcome.quadruples;
    find(quads, Opcode::Block);
    find(quads, Opcode::EndBlock);
    // the function body itself is not bracketed
    let blocks = quads.iter().filter(|q| q.opcode == Opcode::Block).count();
    assert_eq!(blocks, 1);
}

#[test]
fn function_body_is_bracketed_by_func_and_end_func() {
    let outcome = assert_accepts("int main(void) { return 0; }");
    let quads = &outcome.quadruples;
    assert_eq!(quads.first().unwrap().opcode, Opcode::Func);
    assert_eq!(quads.last().unwrap().opcode, Opcode::EndFunc);
}

#[test]
fn multiple_diagnostics_surface_in_one_pass() {
    let outcome = assert_rejects(
        "int main(void) {
            int x;
            int x;
            y = 1;
            return 0;
        }",
    );
    assert!(outcome.diagnostics.len() >= 2);
}

#[test]
fn lexical_error_tokens_are_rejected_by_the_parser() {
    let outcome = assert_rejects(
        "int main(void) {
            int x;
            x = 1 ! 2;
            return 0;
        }",
    );
    assert!(outcome.diagnostics.iter().any(|d| d.is_syntax()));
}

#[test]
fn unconsumed_input_rejects() {
    assert_rejects("int main(void) { return 0; } }");
}
