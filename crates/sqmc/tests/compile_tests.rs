//! End-to-end compilation through the public facade.

use proptest::prelude::*;
use sqmc::{
    ConverterConfig, ErrorKind, JoinPredicatePlacement, Metamodel, ParameterBinding,
    QueryCompiler, QueryParameterBindings, QuerySplitter, SqmError, render,
};
use sqmc_lower::{AttributeMapping, EmbeddableMapping, EntityMapping};
use sqmc_sqm::{
    ParameterKind, SqmAttributeJoin, SqmExpression, SqmFromClause, SqmJoinType, SqmParameter,
    SqmPath, SqmPredicate, SqmQuerySpec, SqmRoot, SqmSelectClause, SqmSelectStatement,
    SqmSetClause, SqmSortSpecification, SqmStatement, SqmUpdateStatement,
};
use sqmc_types::{
    BasicJavaType, BinaryArithmeticOperator, ComparisonOperator, JavaType, LiteralValue,
    SortOrder, TemporalUnit, TypeConfiguration,
};

fn metamodel() -> Metamodel {
    Metamodel::new(TypeConfiguration::new())
        .with_entity(
            EntityMapping::new("Person", "person", "id")
                .with_attribute("name", AttributeMapping::basic("name", BasicJavaType::String))
                .with_attribute("age", AttributeMapping::basic("age", BasicJavaType::Integer))
                .with_attribute("created", AttributeMapping::basic("created", BasicJavaType::LocalDateTime))
                .with_attribute(
                    "address",
                    AttributeMapping::Embedded(
                        EmbeddableMapping::new("Address")
                            .with_attribute("city", AttributeMapping::basic("city", BasicJavaType::String)),
                    ),
                )
                .with_attribute("employer", AttributeMapping::to_one("Company", "employer_id")),
        )
        .with_entity(
            EntityMapping::new("Company", "company", "id")
                .with_attribute("name", AttributeMapping::basic("name", BasicJavaType::String)),
        )
        .with_entity(
            EntityMapping::new("Cat", "cat", "id")
                .with_attribute("name", AttributeMapping::basic("name", BasicJavaType::String)),
        )
        .with_entity(
            EntityMapping::new("Dog", "dog", "id")
                .with_attribute("name", AttributeMapping::basic("name", BasicJavaType::String)),
        )
        .with_polymorphic_type("Animal", &["Cat", "Dog"])
}

fn compiler() -> QueryCompiler {
    QueryCompiler::new(metamodel())
}

fn select(spec: SqmQuerySpec) -> SqmStatement {
    SqmStatement::Select(SqmSelectStatement { query_spec: spec })
}

fn person() -> SqmRoot {
    SqmRoot::new("Person", Some("p"))
}

fn attr(root: &SqmRoot, name: &str, ty: JavaType) -> SqmExpression {
    SqmExpression::Path(SqmPath::basic(&root.navigable_path, name, ty))
}

fn compile_one(statement: &SqmStatement) -> sqmc::Result<String> {
    let mut translations = compiler().compile(statement, &QueryParameterBindings::new())?;
    assert_eq!(translations.len(), 1);
    Ok(render(&translations.remove(0)))
}

fn selected(expression: impl FnOnce(&SqmRoot) -> SqmExpression) -> sqmc::Result<String> {
    let root = person();
    let expression = expression(&root);
    let statement = select(SqmQuerySpec::new(
        SqmFromClause::of(root),
        SqmSelectClause::of(vec![expression]),
    ));
    let translations = compiler().compile(&statement, &QueryParameterBindings::new())?;
    Ok(translations[0].sql_ast.query_spec.select_clause.sql_selections()[0]
        .expression
        .to_string())
}

#[test]
fn person_between_order_by() {
    let root = person();
    let whole = SqmExpression::Path(SqmPath::from_element(&root.navigable_path, "Person"));
    let age = attr(&root, "age", JavaType::INTEGER);
    let name = attr(&root, "name", JavaType::STRING);
    let spec = SqmQuerySpec::new(SqmFromClause::of(root), SqmSelectClause::of(vec![whole]))
        .with_where(SqmPredicate::between(age, SqmExpression::integer(18), SqmExpression::integer(65)))
        .with_order_by(vec![SqmSortSpecification {
            expression: name,
            order: SortOrder::Ascending,
        }]);
    assert_eq!(
        compile_one(&select(spec)).unwrap(),
        "select p1_0.id from person p1_0 where p1_0.age between 18 and 65 order by p1_0.name ASC"
    );
}

#[test]
fn every_compilation_starts_a_fresh_session() {
    let root = person();
    let name = attr(&root, "name", JavaType::STRING);
    let statement = select(SqmQuerySpec::new(SqmFromClause::of(root), SqmSelectClause::of(vec![name])));
    let first = compile_one(&statement).unwrap();
    let second = compile_one(&statement).unwrap();
    assert_eq!(first, "select p1_0.name from person p1_0");
    assert_eq!(first, second);
}

#[test]
fn embedded_join_adds_no_table() {
    let root = person();
    let join = SqmAttributeJoin::new(&root.navigable_path, "address", Some("a"), SqmJoinType::Inner);
    let city = SqmExpression::Path(SqmPath::basic(&join.navigable_path, "city", JavaType::STRING));
    let statement = select(SqmQuerySpec::new(
        SqmFromClause::of(root.with_join(join)),
        SqmSelectClause::of(vec![city]),
    ));
    assert_eq!(compile_one(&statement).unwrap(), "select p1_0.city from person p1_0");
}

#[test]
fn join_predicate_placement_is_configurable() {
    let root = person();
    let join = SqmAttributeJoin::new(&root.navigable_path, "employer", Some("e"), SqmJoinType::Inner);
    let on = SqmPredicate::comparison(
        SqmExpression::Path(SqmPath::basic(&join.navigable_path, "name", JavaType::STRING)),
        ComparisonOperator::Equal,
        SqmExpression::literal(LiteralValue::String("Acme".to_owned())),
    );
    let name = attr(&root, "name", JavaType::STRING);
    let statement = select(SqmQuerySpec::new(
        SqmFromClause::of(root.with_join(join.with_on(on))),
        SqmSelectClause::of(vec![name]),
    ));

    let config = ConverterConfig::from_json(r#"{"join_predicate_placement": "JOIN_ON"}"#).unwrap();
    assert_eq!(config.join_predicate_placement, JoinPredicatePlacement::JoinOn);
    let translations = compiler()
        .with_config(config)
        .compile(&statement, &QueryParameterBindings::new())
        .unwrap();
    assert_eq!(
        render(&translations[0]),
        "select p1_0.name from person p1_0 INNER JOIN company e1_0 on p1_0.employer_id = e1_0.id \
         and e1_0.name = 'Acme'"
    );
}

fn duration(n: i64, unit: TemporalUnit) -> SqmExpression {
    SqmExpression::to_duration(SqmExpression::integer(n), unit)
}

fn shifted(timestamp: SqmExpression, op: BinaryArithmeticOperator, rhs: SqmExpression) -> SqmExpression {
    SqmExpression::binary(timestamp, op, rhs, JavaType::LOCAL_DATE_TIME)
}

fn summed(lhs: SqmExpression, op: BinaryArithmeticOperator, rhs: SqmExpression) -> SqmExpression {
    SqmExpression::binary(lhs, op, rhs, JavaType::DURATION)
}

#[test]
fn duration_sums_added_to_timestamps_reassociate() {
    use BinaryArithmeticOperator::{Add, Subtract};
    use TemporalUnit::{Day, Hour};

    let created = |p: &SqmRoot| attr(p, "created", JavaType::LOCAL_DATE_TIME);

    let nested = selected(|p| shifted(created(p), Add, summed(duration(1, Day), Add, duration(3, Hour)))).unwrap();
    let flat = selected(|p| shifted(shifted(created(p), Add, duration(1, Day)), Add, duration(3, Hour))).unwrap();
    assert_eq!(nested, flat);
    assert_eq!(nested, "timestampadd(hour, 3, timestampadd(day, 1, p1_0.created))");

    let nested =
        selected(|p| shifted(created(p), Subtract, summed(duration(1, Day), Subtract, duration(3, Hour)))).unwrap();
    let flat =
        selected(|p| shifted(shifted(created(p), Subtract, duration(1, Day)), Add, duration(3, Hour))).unwrap();
    assert_eq!(nested, flat);
    assert_eq!(nested, "timestampadd(hour, 3, timestampadd(day, -1, p1_0.created))");
}

#[test]
fn illegal_temporal_arithmetic_is_a_user_error() {
    let err = selected(|p| {
        SqmExpression::binary(
            attr(p, "created", JavaType::LOCAL_DATE_TIME),
            BinaryArithmeticOperator::Multiply,
            attr(p, "created", JavaType::LOCAL_DATE_TIME),
            JavaType::LOCAL_DATE_TIME,
        )
    })
    .unwrap_err();
    assert!(matches!(err, SqmError::IllegalTemporalOperator { .. }));
    assert_eq!(err.kind(), ErrorKind::Semantic);
    assert!(err.is_user_error());
}

#[test]
fn multi_valued_parameter_expands() {
    let root = person();
    let age = attr(&root, "age", JavaType::INTEGER);
    let ids = SqmParameter::named("ids").multi_valued();
    let statement = select(
        SqmQuerySpec::new(SqmFromClause::of(root), SqmSelectClause::of(vec![age.clone()]))
            .with_where(SqmPredicate::in_list(age, vec![SqmExpression::Parameter(ids.clone())])),
    );
    let bindings = QueryParameterBindings::new().with_binding(
        ParameterKind::Named("ids".to_owned()),
        ParameterBinding::multi(vec![LiteralValue::Integer(1), LiteralValue::Integer(2)]),
    );
    let translations = compiler().compile(&statement, &bindings).unwrap();
    let t = &translations[0];
    assert_eq!(render(t), "select p1_0.age from person p1_0 where p1_0.age in (?, ?)");
    assert_eq!(t.jdbc_parameters.len(), 2);
    assert_eq!(t.parameter_xref.expansions(ids.id).len(), 1);
}

#[test]
fn polymorphic_query_compiles_per_implementor() {
    let root = SqmRoot::new("Animal", Some("a"));
    let name = attr(&root, "name", JavaType::STRING);
    let statement = select(SqmQuerySpec::new(SqmFromClause::of(root), SqmSelectClause::of(vec![name])));

    let before = sqmc::lowering_metrics_snapshot();
    let translations = compiler()
        .compile(&statement, &QueryParameterBindings::new())
        .unwrap();
    let after = sqmc::lowering_metrics_snapshot();

    let sql: Vec<String> = translations.iter().map(render).collect();
    assert_eq!(sql, ["select c1_0.name from cat c1_0", "select d1_0.name from dog d1_0"]);
    assert!(translations[0].affected_table_names.contains("cat"));
    assert!(translations[1].affected_table_names.contains("dog"));
    assert!(after.sqmc_split_statements_total >= before.sqmc_split_statements_total + 2);
    assert!(after.sqmc_lower_statements_total >= before.sqmc_lower_statements_total + 2);
}

#[test]
fn update_is_lowered_unsplit_and_not_yet_implemented() {
    let update = SqmStatement::Update(SqmUpdateStatement {
        target: person(),
        set_clause: SqmSetClause {
            assignments: Vec::new(),
        },
        where_clause: None,
    });
    let err = compiler()
        .compile(&update, &QueryParameterBindings::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotYetImplemented);

    let err = QuerySplitter::split(&metamodel(), &update).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

fn time_unit() -> impl Strategy<Value = TemporalUnit> {
    prop::sample::select(vec![
        TemporalUnit::Week,
        TemporalUnit::Day,
        TemporalUnit::Hour,
        TemporalUnit::Minute,
        TemporalUnit::Second,
        TemporalUnit::Millisecond,
        TemporalUnit::Microsecond,
        TemporalUnit::Nanosecond,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn by_unit_folds_to_the_converted_magnitude(n in 0i64..100_000, from in time_unit(), to in time_unit()) {
        let root = person();
        let expression = SqmExpression::by_unit(
            SqmExpression::to_duration(SqmExpression::integer(n), from),
            to,
        );
        let statement = select(SqmQuerySpec::new(
            SqmFromClause::of(root),
            SqmSelectClause::of(vec![expression]),
        ));
        let translations = compiler().compile(&statement, &QueryParameterBindings::new()).unwrap();
        let lowered = &translations[0].sql_ast.query_spec.select_clause.sql_selections()[0].expression;
        let ratio = from.conversion_factor(to).unwrap();
        let expected = ratio.apply(n as f64);
        let actual = lowered.constant_value().unwrap();
        prop_assert!((actual - expected).abs() <= expected.abs() * 1e-12);
    }
}
