//! CIL-shaped fixture modules used across the integration tests. Bodies are
//! written at the instruction level the way a loader would surface them, so
//! the analyses see realistic leaders, branch targets and operands.

#![allow(dead_code)]

use cilscope::model::*;

pub fn instr(offset: u32, opcode: &str, flow: FlowControl, operand: Operand) -> Instruction {
    Instruction::new(offset, opcode, flow, operand)
}

/// Plain instruction: `Next` flow, no operand.
pub fn op(offset: u32, opcode: &str) -> Instruction {
    Instruction::new(offset, opcode, FlowControl::Next, Operand::None)
}

pub fn ret(offset: u32) -> Instruction {
    Instruction::new(offset, "ret", FlowControl::Return, Operand::None)
}

pub fn br(offset: u32, target: u32) -> Instruction {
    Instruction::new(offset, "br.s", FlowControl::Branch, Operand::Target(target))
}

pub fn cond_br(offset: u32, opcode: &str, target: u32) -> Instruction {
    Instruction::new(offset, opcode, FlowControl::CondBranch, Operand::Target(target))
}

pub fn call(offset: u32, declaring: &str, name: &str, ret_type: &str) -> Instruction {
    Instruction::new(
        offset,
        "call",
        FlowControl::Call,
        Operand::Method(method_ref(declaring, name, &[], ret_type)),
    )
}

pub fn callvirt(offset: u32, declaring: &str, name: &str, ret_type: &str) -> Instruction {
    Instruction::new(
        offset,
        "callvirt",
        FlowControl::Call,
        Operand::Method(method_ref(declaring, name, &[], ret_type)),
    )
}

pub fn method_ref(declaring: &str, name: &str, params: &[&str], ret_type: &str) -> MethodRef {
    MethodRef {
        declaring_type: declaring.to_string(),
        name: name.to_string(),
        params: params.iter().map(|s| s.to_string()).collect(),
        return_type: ret_type.to_string(),
    }
}

pub fn body(instructions: Vec<Instruction>) -> MethodBody {
    MethodBody {
        instructions,
        local_variables: Vec::new(),
        exception_handlers: Vec::new(),
    }
}

pub fn body_with_locals(instructions: Vec<Instruction>, locals: &[(u16, &str)]) -> MethodBody {
    MethodBody {
        instructions,
        local_variables: locals
            .iter()
            .map(|(index, ty)| LocalVar {
                index: *index,
                var_type: ty.to_string(),
                name: None,
            })
            .collect(),
        exception_handlers: Vec::new(),
    }
}

pub fn method(declaring: &str, name: &str, return_type: &str, b: Option<MethodBody>) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        full_name: format!("{declaring}.{name}"),
        declaring_type: declaring.to_string(),
        access: MemberAccess::Public,
        return_type: return_type.to_string(),
        body: b,
        ..MethodDef::default()
    }
}

pub fn static_method(
    declaring: &str,
    name: &str,
    return_type: &str,
    b: Option<MethodBody>,
) -> MethodDef {
    MethodDef {
        is_static: true,
        ..method(declaring, name, return_type, b)
    }
}

pub fn param(name: &str, ty: &str) -> ParamDef {
    ParamDef {
        name: name.to_string(),
        param_type: ty.to_string(),
        is_optional: false,
    }
}

pub fn field(name: &str, ty: &str, access: MemberAccess, is_static: bool) -> FieldDef {
    FieldDef {
        name: name.to_string(),
        field_type: ty.to_string(),
        access,
        is_static,
        ..FieldDef::default()
    }
}

pub fn class(ns: &str, name: &str) -> TypeDef {
    TypeDef {
        full_name: if ns.is_empty() {
            name.to_string()
        } else {
            format!("{ns}.{name}")
        },
        namespace: ns.to_string(),
        name: name.to_string(),
        visibility: TypeVisibility::Public,
        base_type: Some("System.Object".to_string()),
        ..TypeDef::default()
    }
}

pub fn interface(ns: &str, name: &str) -> TypeDef {
    TypeDef {
        is_interface: true,
        is_abstract: true,
        base_type: None,
        ..class(ns, name)
    }
}

pub fn module(name: &str, types: Vec<TypeDef>) -> Module {
    Module {
        guid: ModuleGuid(0x00c0ffee_0000_0000_0000_0000_0000_0001),
        assembly: AssemblyInfo {
            name: name.to_string(),
            version: "1.0.0.0".to_string(),
            ..AssemblyInfo::default()
        },
        types,
    }
}

/// `static int Add(int a, int b) => a + b;` - one straight-line block.
pub fn add_method() -> MethodDef {
    let b = body(vec![op(0, "ldarg.0"), op(1, "ldarg.1"), op(2, "add"), ret(3)]);
    let mut m = static_method("Math.Ops", "Add", "System.Int32", Some(b));
    m.parameters = vec![param("a", "System.Int32"), param("b", "System.Int32")];
    m
}

/// `static int Abs(int x) { if (x < 0) return -x; return x; }`
/// Three blocks: condition, negate+return, plain return.
pub fn abs_method() -> MethodDef {
    let b = body(vec![
        op(0, "ldarg.0"),
        op(1, "ldc.i4.0"),
        cond_br(2, "bge.s", 6),
        op(3, "ldarg.0"),
        op(4, "neg"),
        ret(5),
        op(6, "ldarg.0"),
        ret(7),
    ]);
    let mut m = static_method("Math.Ops", "Abs", "System.Int32", Some(b));
    m.parameters = vec![param("x", "System.Int32")];
    m
}

/// `static int Sum(int n) { int s = 0; while (n > 0) { s += n; n--; } return s; }`
/// Exactly one back edge (body block into the condition header).
pub fn sum_loop_method() -> MethodDef {
    let b = body_with_locals(
        vec![
            op(0, "ldc.i4.0"),
            instr(1, "stloc.0", FlowControl::Next, Operand::None),
            br(2, 11),
            instr(3, "ldloc.0", FlowControl::Next, Operand::None),
            op(4, "ldarg.0"),
            op(5, "add"),
            instr(6, "stloc.0", FlowControl::Next, Operand::None),
            op(7, "ldarg.0"),
            op(8, "ldc.i4.1"),
            op(9, "sub"),
            instr(10, "starg.s", FlowControl::Next, Operand::Argument(0)),
            op(11, "ldarg.0"),
            op(12, "ldc.i4.0"),
            cond_br(13, "bgt.s", 3),
            instr(14, "ldloc.0", FlowControl::Next, Operand::None),
            ret(15),
        ],
        &[(0, "System.Int32")],
    );
    let mut m = static_method("Math.Ops", "Sum", "System.Int32", Some(b));
    m.parameters = vec![param("n", "System.Int32")];
    m
}

/// A method switching over four arms with a shared fall-through.
pub fn switch_method() -> MethodDef {
    let b = body(vec![
        op(0, "ldarg.0"),
        instr(
            1,
            "switch",
            FlowControl::CondBranch,
            Operand::Switch(vec![6, 8, 10]),
        ),
        op(2, "nop"), // default arm
        br(3, 12),
        op(6, "nop"),
        br(7, 12),
        op(8, "nop"),
        br(9, 12),
        op(10, "nop"),
        br(11, 12),
        op(12, "nop"),
        ret(13),
    ]);
    let mut m = static_method("Math.Ops", "Pick", "System.Void", Some(b));
    m.parameters = vec![param("x", "System.Int32")];
    m
}

/// Try/catch body: the try region covers offsets [1, 4), the handler [4, 6).
pub fn try_catch_method() -> MethodDef {
    let mut b = body(vec![
        op(0, "nop"),
        op(1, "nop"),
        call(2, "Risky.Io", "Touch", "System.Void"),
        instr(3, "leave.s", FlowControl::Branch, Operand::Target(6)),
        op(4, "pop"),
        instr(5, "leave.s", FlowControl::Branch, Operand::Target(6)),
        op(6, "nop"),
        ret(7),
    ]);
    b.exception_handlers.push(ExceptionHandler {
        kind: HandlerKind::Catch,
        try_start: 1,
        try_end: 4,
        handler_start: 4,
        handler_end: 6,
        filter_start: None,
        catch_type: Some("System.Exception".to_string()),
    });
    let mut m = static_method("Risky.Io", "Guarded", "System.Void", Some(b));
    m.full_name = "Risky.Io.Guarded".to_string();
    m
}

/// Module with the arithmetic fixtures on one type.
pub fn math_module() -> Module {
    let mut ops = class("Math", "Ops");
    ops.methods = vec![
        add_method(),
        abs_method(),
        sum_loop_method(),
        switch_method(),
    ];
    module("MathLib", vec![ops])
}

/// `IShape { double Area(); }` with `Circle`/`Square` implementors and a
/// caller dispatching through the interface.
pub fn shapes_module() -> Module {
    let mut ishape = interface("Shapes", "IShape");
    ishape.methods = vec![MethodDef {
        is_virtual: true,
        is_abstract: true,
        ..method("Shapes.IShape", "Area", "System.Double", None)
    }];

    let implementor = |name: &str| {
        let mut t = class("Shapes", name);
        t.interfaces = vec!["Shapes.IShape".to_string()];
        t.methods = vec![MethodDef {
            is_virtual: true,
            ..method(
                &format!("Shapes.{name}"),
                "Area",
                "System.Double",
                Some(body(vec![op(0, "ldc.r8"), ret(1)])),
            )
        }];
        t
    };

    let mut geometry = class("Shapes", "Geometry");
    geometry.methods = vec![static_method(
        "Shapes.Geometry",
        "Measure",
        "System.Double",
        Some(body(vec![
            op(0, "ldarg.0"),
            callvirt(1, "Shapes.IShape", "Area", "System.Double"),
            ret(2),
        ])),
    )];

    module(
        "Shapes",
        vec![ishape, implementor("Circle"), implementor("Square"), geometry],
    )
}

/// Classic singleton: private ctor, private static instance field, public
/// static `Instance` property.
pub fn logger_singleton_type() -> TypeDef {
    let mut logger = class("Diag", "Logger");
    logger.is_sealed = true;
    logger.fields = vec![field(
        "_instance",
        "Diag.Logger",
        MemberAccess::Private,
        true,
    )];
    logger.methods = vec![
        MethodDef {
            is_constructor: true,
            access: MemberAccess::Private,
            ..method("Diag.Logger", ".ctor", "System.Void", Some(body(vec![ret(0)])))
        },
        method(
            "Diag.Logger",
            "Log",
            "System.Void",
            Some(body(vec![ret(0)])),
        ),
    ];
    logger.properties = vec![PropertyDef {
        name: "Instance".to_string(),
        property_type: "Diag.Logger".to_string(),
        access: MemberAccess::Public,
        is_static: true,
        has_getter: true,
        has_setter: false,
        metadata_token: 0,
    }];
    logger
}

/// Obfuscation triage module: ConfuserEx markers (assembly attribute plus the
/// embedded attribute type), 40 two-character type names, 30 proxy methods.
pub fn obfuscated_module() -> Module {
    let mut types = Vec::new();

    let marker = class("", "ConfuserExProtectedAttribute");
    types.push(marker);

    for i in 0..40 {
        let mut t = class("", &format!("a{i}"));
        if i < 30 {
            t.methods = vec![static_method(
                &format!("a{i}"),
                "p",
                "System.Void",
                Some(body(vec![
                    op(0, "ldarg.0"),
                    call(1, "a0", "q", "System.Void"),
                    ret(2),
                ])),
            )];
        }
        types.push(t);
    }

    let mut m = module("Protected", types);
    m.assembly.custom_attributes = vec![CustomAttribute {
        attribute_type: "ConfuserExProtectedAttribute".to_string(),
    }];
    m
}
