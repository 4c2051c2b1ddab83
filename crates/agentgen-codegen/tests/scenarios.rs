use agentgen_codegen::expr::{Primitive, TypeLocation, UserType};
use agentgen_codegen::imports::ImportSpec;
use agentgen_codegen::specs::ToolSpecsIndex;
use agentgen_codegen::{
    Attribute, CodegenError, MethodBinding, ServerDataProjection, Service, Tool, Toolset,
    TransformPlan, TransformPlanner, load_design, plan_toolset_transforms, render_transforms,
};
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;
use std::rc::Rc;

const ROOT: &str = "example.com/app/gen";

fn user(name: &str, service: &str, attribute: Attribute) -> Attribute {
    Attribute::user(Rc::new(UserType::new(name, attribute).with_service(service)))
}

fn citation() -> Attribute {
    user(
        "Citation",
        "alpha",
        Attribute::object([("url", Attribute::string())]).with_required(["url"]),
    )
}

fn docs_toolset(tool: Tool) -> Toolset {
    Toolset::new("alpha.docs")
        .with_specs_dir("gen/alpha/agents/docs/specs/docs")
        .with_source_service(Service::new("alpha"))
        .with_tool(tool)
}

fn summarize_tool(projection: ServerDataProjection) -> Tool {
    let result = Attribute::object([
        ("sources", Attribute::array(citation())),
        ("summary", Attribute::string()),
        ("title", Attribute::string()),
        (
            "score",
            Attribute::primitive(Primitive::Float64).with_default(Value::from(0.5)),
        ),
    ])
    .with_required(["summary"]);
    let method = MethodBinding::new("Summarize", Attribute::string(), result)
        .with_type_refs("string", "*alpha.SummarizeResult");
    Tool::new("alpha.docs", "summarize", Attribute::string(), Attribute::empty())
        .bound_to(method)
        .with_server_data(projection)
}

fn function_names(plan: &TransformPlan) -> Vec<&str> {
    plan.functions.iter().map(|f| f.name.as_str()).collect()
}

fn assert_helper_names_unique(plan: &TransformPlan) {
    let names: HashSet<_> = plan.helpers.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names.len(), plan.helpers.len(), "{:?}", plan.helpers);
}

#[test]
fn test_single_method_backed_tool_with_identical_shapes() {
    let method = MethodBinding::new("Echo", Attribute::string(), Attribute::string())
        .with_type_refs("string", "string");
    let toolset = Toolset::new("alpha.ops")
        .with_specs_dir("gen/alpha/agents/ops/specs/ops")
        .with_source_service(Service::new("alpha"))
        .with_tool(
            Tool::new("alpha.ops", "echo", Attribute::string(), Attribute::string())
                .bound_to(method),
        );

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();

    assert_eq!(plan.path, "gen/alpha/agents/ops/specs/ops/transforms.go");
    assert_eq!(plan.package, "ops");
    assert_eq!(
        plan.imports,
        vec![ImportSpec::named("example.com/app/gen/alpha", "alpha")]
    );
    assert!(plan.helpers.is_empty());
    assert_eq!(
        function_names(&plan),
        vec!["InitEchoMethodPayload", "InitEchoToolResult"]
    );
    for function in &plan.functions {
        assert_eq!(function.param_type_ref, "string");
        assert_eq!(function.result_type_ref, "string");
        assert_eq!(function.body, "res := v\n");
        assert!(!function.nil_input_returns_nil);
    }
}

#[test]
fn test_cross_service_binding() {
    let payload = user(
        "LookupPayload",
        "bravo",
        Attribute::object([("id", Attribute::string())]).with_required(["id"]),
    );
    let result = user(
        "LookupResult",
        "bravo",
        Attribute::object([("found", Attribute::primitive(Primitive::Boolean))])
            .with_required(["found"]),
    );
    let method = MethodBinding::new("Lookup", payload, result)
        .with_type_refs("*bravo.LookupPayload", "*bravo.LookupResult");
    let tool = Tool::new(
        "alpha.lookup",
        "by_id",
        Attribute::object([("id", Attribute::string())]).with_required(["id"]),
        Attribute::object([("found", Attribute::primitive(Primitive::Boolean))])
            .with_required(["found"]),
    )
    .bound_to(method);
    let toolset = Toolset::new("alpha.lookup")
        .with_specs_dir("gen/alpha/agents/lookup/specs/lookup")
        .with_source_service(Service::new("bravo"))
        .with_tool(tool);

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();

    assert_eq!(
        plan.imports,
        vec![ImportSpec::named("example.com/app/gen/bravo", "bravo")]
    );
    assert!(!plan.imports.iter().any(|i| i.path.ends_with("/alpha")));

    let payload = &plan.functions[0];
    assert_eq!(payload.name, "InitByIDMethodPayload");
    assert_eq!(payload.param_type_ref, "*ByIDPayload");
    assert_eq!(payload.result_type_ref, "*bravo.LookupPayload");
    assert_eq!(payload.body, "res := &bravo.LookupPayload{\n\tID: v.ID,\n}\n");

    let result = &plan.functions[1];
    assert_eq!(result.name, "InitByIDToolResult");
    assert_eq!(result.param_type_ref, "*bravo.LookupResult");
    assert_eq!(result.result_type_ref, "*ByIDResult");
    assert_eq!(result.body, "res := &ByIDResult{\n\tFound: v.Found,\n}\n");
}

#[test]
fn test_nested_type_in_both_directions_gets_two_helpers() {
    let citation = || {
        user(
            "Citation",
            "bravo",
            Attribute::object([("url", Attribute::string())]).with_required(["url"]),
        )
    };
    let cite = || Attribute::object([("cite", citation())]).with_required(["cite"]);
    let method = MethodBinding::new(
        "Lookup",
        user("LookupPayload", "bravo", cite()),
        user("LookupResult", "bravo", cite()),
    )
    .with_type_refs("*bravo.LookupPayload", "*bravo.LookupResult");
    let toolset = Toolset::new("alpha.lookup")
        .with_specs_dir("gen/alpha/agents/lookup/specs/lookup")
        .with_source_service(Service::new("bravo"))
        .with_tool(Tool::new("alpha.lookup", "by_id", cite(), cite()).bound_to(method));

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();

    assert_eq!(
        function_names(&plan),
        vec!["InitByIDMethodPayload", "InitByIDToolResult"]
    );
    assert_eq!(
        plan.functions[0].body,
        "res := &bravo.LookupPayload{}\nif v.Cite != nil {\n\tres.Cite = transformCitationToBravoCitation(v.Cite)\n}\n"
    );
    let signatures: Vec<_> = plan
        .helpers
        .iter()
        .map(|h| (h.name.as_str(), h.param_type_ref.as_str(), h.result_type_ref.as_str()))
        .collect();
    assert_eq!(
        signatures,
        vec![
            ("transformCitationToBravoCitation", "*Citation", "*bravo.Citation"),
            ("transformBravoCitationToCitation", "*bravo.Citation", "*Citation"),
        ]
    );

    let source = render_transforms(&plan).unwrap();
    for helper in &plan.helpers {
        let decl = format!("func {}(", helper.name);
        assert_eq!(source.matches(&decl).count(), 1, "{decl}");
    }
}

#[test]
fn test_shape_mismatch_skips_payload_direction() {
    let method = MethodBinding::new(
        "Echo",
        Attribute::object([("query", Attribute::string())]).with_required(["query"]),
        Attribute::string(),
    )
    .with_type_refs("*alpha.EchoPayload", "string");
    let toolset = Toolset::new("alpha.ops")
        .with_specs_dir("gen/alpha/agents/ops/specs/ops")
        .with_source_service(Service::new("alpha"))
        .with_tool(
            Tool::new(
                "alpha.ops",
                "echo",
                Attribute::object([("q", Attribute::string())]).with_required(["q"]),
                Attribute::string(),
            )
            .bound_to(method),
        );

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();
    assert_eq!(function_names(&plan), vec!["InitEchoToolResult"]);

    // With the result direction gone too, nothing is left to emit.
    let mut toolset = toolset;
    toolset.tools[0].result = Attribute::primitive(Primitive::Int);
    assert!(plan_toolset_transforms(ROOT, &toolset).unwrap().is_none());
}

#[test]
fn test_server_data_with_optional_non_primitive_source() {
    let toolset = docs_toolset(summarize_tool(ServerDataProjection::new("sources", "sources")));

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();

    let function = plan
        .functions
        .iter()
        .find(|f| f.name == "InitSummarizeSourcesServerData")
        .unwrap();
    assert!(function.nil_input_returns_nil);
    assert_eq!(function.param_type_ref, "[]*alpha.Citation");
    assert_eq!(function.result_type_ref, "SummarizeSourcesServerData");
    assert_eq!(
        function.body,
        "res := make(SummarizeSourcesServerData, len(v))\nfor i, val := range v {\n\tres[i] = transformAlphaCitationToCitation(val)\n}\n"
    );

    assert_eq!(plan.helpers.len(), 1);
    let helper = &plan.helpers[0];
    assert_eq!(helper.name, "transformAlphaCitationToCitation");
    assert_eq!(helper.param_type_ref, "*alpha.Citation");
    assert_eq!(helper.result_type_ref, "*Citation");
    assert_eq!(
        helper.body,
        "if v == nil {\n\treturn nil\n}\nres := &Citation{\n\tURL: v.URL,\n}\n"
    );
}

#[test]
fn test_server_data_nil_guard_rules() {
    let cases = [
        ("summary", false, "string", "res := v\n"),
        ("title", true, "*string", "res := (*v)\n"),
        ("score", false, "float64", "res := v\n"),
    ];
    for (field, guarded, param, body) in cases {
        let toolset = docs_toolset(summarize_tool(ServerDataProjection::new(field, field)));
        let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();
        let function = plan
            .functions
            .iter()
            .find(|f| f.name.ends_with("ServerData"))
            .unwrap();
        assert_eq!(function.nil_input_returns_nil, guarded, "{field}");
        assert_eq!(function.param_type_ref, param, "{field}");
        assert_eq!(function.body, body, "{field}");
    }
}

#[test]
fn test_server_data_with_missing_source_field() {
    let toolset = docs_toolset(summarize_tool(ServerDataProjection::new("sources", "nope")));

    let err = plan_toolset_transforms(ROOT, &toolset).unwrap_err();

    assert!(matches!(err, CodegenError::ServerDataFieldMissing { .. }));
    let message = err.to_string();
    assert!(message.contains("alpha.docs.summarize"), "{message}");
    assert!(message.contains("sources"), "{message}");
    assert!(message.contains("nope"), "{message}");
}

#[test]
fn test_server_data_incompatible_schema_is_fatal() {
    let projection = ServerDataProjection::new("sources", "sources")
        .with_schema(Attribute::array(Attribute::string()));
    let toolset = docs_toolset(summarize_tool(projection));

    let err = plan_toolset_transforms(ROOT, &toolset).unwrap_err();
    assert!(matches!(err, CodegenError::ServerDataIncompatible { .. }));
}

#[test]
fn test_derived_import_aliases_are_numbered() {
    let a = user(
        "A",
        "v1/foo",
        Attribute::object([("id", Attribute::string())]).with_required(["id"]),
    );
    let b = user(
        "B",
        "v2/foo",
        Attribute::object([("id", Attribute::string())]).with_required(["id"]),
    );
    let shape = || Attribute::object([("left", a.clone()), ("right", b.clone())]);
    let method = MethodBinding::new("Compare", Attribute::empty(), shape())
        .with_type_refs("*alpha.ComparePayload", "*alpha.CompareResult");
    let toolset = Toolset::new("alpha.ops")
        .with_specs_dir("gen/alpha/agents/ops/specs/ops")
        .with_source_service(Service::new("alpha"))
        .with_tool(Tool::new("alpha.ops", "compare", Attribute::empty(), shape()).bound_to(method));

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();

    assert_eq!(
        plan.imports,
        vec![
            ImportSpec::named("example.com/app/gen/alpha", "alpha"),
            ImportSpec::named("example.com/app/gen/v1/foo", "foo"),
            ImportSpec::named("example.com/app/gen/v2/foo", "foo2"),
        ]
    );
    let aliases: HashSet<_> = plan.imports.iter().map(|i| i.name.clone()).collect();
    assert_eq!(aliases.len(), plan.imports.len());
}

#[test]
fn test_explicit_alias_collision_is_fatal() {
    let doc = Attribute::user(Rc::new(
        UserType::new(
            "Doc",
            Attribute::object([("id", Attribute::string())]).with_required(["id"]),
        )
        .with_location(TypeLocation::new("example.com/shared/alpha", "alpha")),
    ));
    let method = MethodBinding::new("Fetch", Attribute::empty(), doc.clone())
        .with_type_refs("*alpha.FetchPayload", "*alpha.Doc");
    let toolset = docs_toolset(
        Tool::new("alpha.docs", "fetch", Attribute::empty(), doc).bound_to(method),
    );

    let err = plan_toolset_transforms(ROOT, &toolset).unwrap_err();
    assert!(matches!(err, CodegenError::ImportAliasCollision { .. }));
}

#[test]
fn test_located_types_keep_their_alias() {
    let doc = Attribute::user(Rc::new(
        UserType::new(
            "Doc",
            Attribute::object([("id", Attribute::string())]).with_required(["id"]),
        )
        .with_location(TypeLocation::new("example.com/shared/types", "shared")),
    ));
    let method = MethodBinding::new("Fetch", Attribute::empty(), doc.clone())
        .with_type_refs("*alpha.FetchPayload", "*shared.Doc");
    let toolset = docs_toolset(
        Tool::new("alpha.docs", "fetch", Attribute::empty(), doc).bound_to(method),
    );

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();
    assert_eq!(
        plan.imports,
        vec![
            ImportSpec::named("example.com/app/gen/alpha", "alpha"),
            ImportSpec::named("example.com/shared/types", "shared"),
        ]
    );
    assert_eq!(plan.functions[0].name, "InitFetchToolResult");
    assert_eq!(plan.functions[0].result_type_ref, "*shared.Doc");
}

#[test]
fn test_one_package_under_two_located_aliases() {
    let location = |alias: &str| TypeLocation::new("example.com/shared/types", alias);
    let a = Attribute::user(Rc::new(
        UserType::new(
            "A",
            Attribute::object([("id", Attribute::string())]).with_required(["id"]),
        )
        .with_location(location("types")),
    ));
    let b = Attribute::user(Rc::new(
        UserType::new(
            "B",
            Attribute::object([("id", Attribute::string())]).with_required(["id"]),
        )
        .with_location(location("shared")),
    ));
    let pair = || Attribute::object([("a", a.clone()), ("b", b.clone())]).with_required(["a", "b"]);
    let method = MethodBinding::new("Pair", Attribute::empty(), user("PairResult", "alpha", pair()))
        .with_type_refs("*alpha.PairPayload", "*alpha.PairResult");
    let toolset = docs_toolset(
        Tool::new("alpha.docs", "pair", Attribute::empty(), pair()).bound_to(method),
    );

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();

    assert_eq!(
        plan.imports,
        vec![
            ImportSpec::named("example.com/app/gen/alpha", "alpha"),
            ImportSpec::named("example.com/shared/types", "shared"),
            ImportSpec::named("example.com/shared/types", "types"),
        ]
    );
    let source = render_transforms(&plan).unwrap();
    assert!(source.contains("func transformSharedBToSharedB(v *shared.B) *shared.B {"));
    assert!(source.contains("func transformTypesAToTypesA(v *types.A) *types.A {"));
    assert!(source.contains("\tshared \"example.com/shared/types\"\n"));
    assert!(source.contains("\ttypes \"example.com/shared/types\"\n"));
}

#[test]
fn test_supplied_index_without_server_data_type_is_fatal() {
    let toolset = docs_toolset(summarize_tool(ServerDataProjection::new("sources", "sources")));
    let mut index = ToolSpecsIndex::for_toolset(&toolset);
    assert!(index.remove("SummarizeSourcesServerData").is_some());

    let err = <TransformPlanner>::default()
        .plan_with_index(ROOT, &toolset, index)
        .unwrap_err();

    assert!(matches!(
        err,
        CodegenError::ServerDataTypeMissing { ref type_name, .. }
            if type_name == "SummarizeSourcesServerData"
    ));
}

#[test]
fn test_tools_without_methods_yield_no_file() {
    let toolset = Toolset::new("alpha.ops")
        .with_specs_dir("gen/alpha/agents/ops/specs/ops")
        .with_source_service(Service::new("alpha"))
        .with_tool(Tool::new("alpha.ops", "echo", Attribute::string(), Attribute::string()))
        .with_tool(Tool::new("alpha.ops", "ping", Attribute::empty(), Attribute::string()));
    assert!(plan_toolset_transforms(ROOT, &toolset).unwrap().is_none());
}

#[test]
fn test_helpers_are_shared_across_tools() {
    let toolset = docs_toolset(summarize_tool(ServerDataProjection::new("sources", "sources")));
    let mut search = summarize_tool(ServerDataProjection::new("sources", "sources"));
    search.name = "search".to_string();
    search.qualified_name = "alpha.docs.search".to_string();
    // Citation travels into the method and back out of it.
    let cite = || Attribute::object([("cite", citation())]).with_required(["cite"]);
    let annotate = Tool::new("alpha.docs", "annotate", cite(), cite()).bound_to(
        MethodBinding::new(
            "Annotate",
            user("AnnotatePayload", "alpha", cite()),
            user("AnnotateResult", "alpha", cite()),
        )
        .with_type_refs("*alpha.AnnotatePayload", "*alpha.AnnotateResult"),
    );
    let toolset = toolset.with_tool(search).with_tool(annotate);

    let plan = plan_toolset_transforms(ROOT, &toolset).unwrap().unwrap();

    assert_eq!(
        function_names(&plan)
            .into_iter()
            .filter(|name| name.ends_with("ServerData"))
            .collect::<Vec<_>>(),
        vec!["InitSummarizeSourcesServerData", "InitSearchSourcesServerData"]
    );
    assert_helper_names_unique(&plan);
    let names: Vec<_> = plan.helpers.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "transformAlphaCitationToCitation",
            "transformCitationToAlphaCitation",
        ]
    );
}

#[test]
fn test_planning_is_deterministic() {
    let toolset = docs_toolset(summarize_tool(ServerDataProjection::new("sources", "sources")));
    let first = plan_toolset_transforms(ROOT, &toolset).unwrap();
    let second = plan_toolset_transforms(ROOT, &toolset).unwrap();
    assert_eq!(first, second);
    assert_helper_names_unique(&first.unwrap());
}

#[test]
fn test_design_document_to_go_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(
        br#"
service: { name: alpha }
root: example.com/app/gen
toolsets:
  - name: alpha.ops
    specs_dir: gen/alpha/agents/ops/specs/ops
    tools:
      - name: echo
        args: string
        return: string
        method: { name: Echo, payload: string, result: string, payload_ref: string, result_ref: string }
"#,
    )
    .unwrap();

    let design = load_design(file.path()).unwrap();
    let root = design.root.clone().unwrap();
    let plan = plan_toolset_transforms(&root, &design.toolsets[0])
        .unwrap()
        .unwrap();
    let source = render_transforms(&plan).unwrap();

    assert!(source.starts_with("// Code generated by agentgen. DO NOT EDIT.\n\npackage ops\n"));
    assert!(source.contains("import (\n\talpha \"example.com/app/gen/alpha\"\n)\n"));
    assert!(source.contains("func InitEchoMethodPayload(v string) string {\n\tres := v\n\treturn res\n}\n"));
    assert!(source.contains("func InitEchoToolResult(v string) string {\n\tres := v\n\treturn res\n}\n"));
}

#[test]
fn test_demo_design_plans_every_toolset() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/docs.yaml");
    let design = load_design(path).unwrap();
    let root = design.root.clone().unwrap();

    let docs = plan_toolset_transforms(&root, design.toolset("alpha.docs").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(
        function_names(&docs),
        vec!["InitSummarizeMethodPayload", "InitSummarizeSourcesServerData"]
    );
    assert!(docs.functions[1].nil_input_returns_nil);

    let lookup = plan_toolset_transforms(&root, design.toolset("alpha.lookup").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(lookup.imports[0], ImportSpec::named("example.com/app/gen/bravo", "bravo"));
    assert_eq!(
        function_names(&lookup),
        vec!["InitByIDMethodPayload", "InitByIDToolResult"]
    );
}
