use criterion::{black_box, criterion_group, criterion_main, Criterion};
use field_graph::{
    ChildArrayField, FieldDeclarations, JsonSerializer, ObjectClass, ObjectFactory, ObjectGraph, ObjectId,
    PtrArrayField, ValueField,
};

struct Sample;

impl Sample {
    const LABEL: ValueField<String> = ValueField::new("label");
    const READINGS: ValueField<Vec<f64>> = ValueField::new("readings");
}

impl ObjectClass for Sample {
    const CLASS_KEYWORD: &'static str = "Sample";

    fn define_fields(fields: &mut FieldDeclarations<'_>) {
        fields.value(Self::LABEL, String::new());
        fields.value(Self::READINGS, Vec::new());
    }
}

struct Batch;

impl Batch {
    const SAMPLES: ChildArrayField<Sample> = ChildArrayField::new("samples");
    const FLAGGED: PtrArrayField<Sample> = PtrArrayField::new("flagged");
}

impl ObjectClass for Batch {
    const CLASS_KEYWORD: &'static str = "Batch";

    fn define_fields(fields: &mut FieldDeclarations<'_>) {
        fields.child_array(Self::SAMPLES);
        fields.ptr_array(Self::FLAGGED);
    }
}

fn factory() -> ObjectFactory {
    let mut factory = ObjectFactory::new();
    factory.register::<Sample>();
    factory.register::<Batch>();
    factory
}

fn batch(graph: &mut ObjectGraph, samples: usize) -> ObjectId {
    let batch = graph.create::<Batch>().unwrap();
    for i in 0..samples {
        let sample = graph.create::<Sample>().unwrap();
        graph.set_value(sample, Sample::LABEL, format!("sample-{}", i)).unwrap();
        graph.set_value(sample, Sample::READINGS, vec![i as f64; 8]).unwrap();
        graph.push_child(batch, Batch::SAMPLES, sample).unwrap();
        if i % 3 == 0 {
            graph.push_ptr(batch, Batch::FLAGGED, sample).unwrap();
        }
    }
    batch
}

fn criterion_benchmark(c: &mut Criterion) {
    let factory = factory();
    let serializer = JsonSerializer::new(&factory);
    let mut graph = ObjectGraph::new();
    let root = batch(&mut graph, 500);
    let text = serializer.write_object_to_string(&mut graph, root).unwrap();

    c.bench_function("write_batch_500", |b| {
        b.iter(|| black_box(serializer.write_object_to_string(&mut graph, root).unwrap()))
    });

    c.bench_function("read_batch_500", |b| {
        b.iter(|| {
            let mut fresh = ObjectGraph::new();
            black_box(serializer.create_object_from_str(&mut fresh, &text).unwrap())
        })
    });

    c.bench_function("copy_batch_500", |b| {
        b.iter(|| {
            let (copy, _) = serializer.copy_by_serialization(&mut graph, root).unwrap();
            graph.destroy(copy);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
