use attrchain::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn int() -> TypeRef {
    TypeRef::numeric(NumericKind::Int)
}

fn catalog() -> SignatureCatalog {
    SignatureCatalog::from_declarations([
        AttributeDeclaration::new("Parse").transforms(TypeRef::Text, int()),
        AttributeDeclaration::new("Check").validates(int()),
        AttributeDeclaration::new("Trim").validates(TypeRef::Text),
        AttributeDeclaration::new("Flag").validates(TypeRef::Boolean),
    ])
    .expect("bench catalog is well formed")
}

/// `checks` int checks and `trims` text checks declared before the parse.
fn reversed_chain(catalog: &SignatureCatalog, checks: usize, trims: usize) -> Chain {
    let check = catalog.lookup("Check").expect("Check");
    let trim = catalog.lookup("Trim").expect("Trim");
    let parse = catalog.lookup("Parse").expect("Parse");

    let mut member = Member::new("Bench", TypeRef::Text);
    for _ in 0..checks {
        member = member.with_attribute(check);
    }
    for _ in 0..trims {
        member = member.with_attribute(trim);
    }
    member.with_attribute(parse).chains().remove(0)
}

fn bench_reorder_found(c: &mut Criterion) {
    let catalog = catalog();
    let options = ResolverOptions::new().with_max_permutable_stages(16);
    let search = ReorderingSearch::new(TypeCompatibilityResolver::with_options(&catalog, &options), &options);

    let mut group = c.benchmark_group("reorder_found");
    for stages in [4usize, 8, 12, 16] {
        let chain = reversed_chain(&catalog, stages / 2, stages - stages / 2 - 1);
        group.bench_with_input(BenchmarkId::from_parameter(stages), &chain, |b, chain| {
            b.iter(|| {
                let result = search.search(black_box(chain));
                assert!(result.found);
            })
        });
    }
    group.finish();
}

fn bench_reorder_exhausted(c: &mut Criterion) {
    let catalog = catalog();
    let options = ResolverOptions::new().with_max_permutable_stages(16);
    let search = ReorderingSearch::new(TypeCompatibilityResolver::with_options(&catalog, &options), &options);
    let flag = catalog.lookup("Flag").expect("Flag");

    let mut group = c.benchmark_group("reorder_exhausted");
    for stages in [4usize, 8, 12] {
        let mut chain = reversed_chain(&catalog, stages - 2, 0);
        chain.stages.push(StageUsage::new(flag, stages - 1));
        group.bench_with_input(BenchmarkId::from_parameter(stages), &chain, |b, chain| {
            b.iter(|| {
                let result = search.search(black_box(chain));
                assert!(!result.found);
            })
        });
    }
    group.finish();
}

fn bench_analyze_members(c: &mut Criterion) {
    let catalog = SignatureCatalog::with_builtins();
    let lookup = |name: &str| catalog.lookup(name).expect("built-in");
    let members: Vec<Member> = (0..512)
        .map(|i| {
            Member::new(format!("M{}", i), TypeRef::Text.nullable())
                .with_attribute(lookup("Positive"))
                .with_attribute(lookup("NotEmpty"))
                .with_attribute(lookup("Numeric"))
        })
        .collect();

    for parallel in [false, true] {
        let analyzer = ChainAnalyzer::new(&catalog, ResolverOptions::new().with_parallel(parallel));
        let name = if parallel { "analyze_members_parallel" } else { "analyze_members_serial" };
        c.bench_function(name, |b| b.iter(|| analyzer.analyze_members(black_box(&members))));
    }
}

criterion_group!(benches, bench_reorder_found, bench_reorder_exhausted, bench_analyze_members);
criterion_main!(benches);
