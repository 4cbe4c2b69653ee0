use core_types::{
    CompileError, CompileErrors, ErrorKind, ErrorSite, InterpretError, InterpretResult,
    RuntimeError, StackFrame,
};

#[test]
fn test_runtime_error_report_lists_frames_innermost_first() {
    let mut err = RuntimeError::new(ErrorKind::TypeError, "Operand must be a number.");
    err.stack = vec![
        StackFrame {
            function_name: Some("inner".to_string()),
            line: 2,
        },
        StackFrame {
            function_name: Some("outer".to_string()),
            line: 5,
        },
        StackFrame {
            function_name: None,
            line: 7,
        },
    ];

    assert_eq!(
        err.report(),
        "Operand must be a number.\n[line 2] in inner()\n[line 5] in outer()\n[line 7] in script"
    );
}

#[test]
fn test_interpret_error_is_transparent() {
    let err: InterpretError = RuntimeError::new(ErrorKind::StackOverflow, "Stack overflow.").into();
    assert_eq!(err.to_string(), "Stack overflow.");

    let err: InterpretError = CompileErrors(vec![CompileError {
        line: 3,
        site: ErrorSite::Lexeme("return".to_string()),
        message: "Can't return from top-level code.".to_string(),
    }])
    .into();
    assert_eq!(
        err.to_string(),
        "[line 3] Error at 'return': Can't return from top-level code."
    );
}

#[test]
fn test_exit_codes() {
    assert_eq!(InterpretResult::Ok.exit_code(), 0);
    assert_eq!(InterpretResult::CompileError.exit_code(), 72);
    assert_eq!(InterpretResult::RuntimeError.exit_code(), 73);
}
