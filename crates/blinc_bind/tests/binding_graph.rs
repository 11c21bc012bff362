use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blinc_bind::{
    adapters, discover, BindValue, Bindable, BindingAdapter, ModelProperty, TypedViewSlot,
    ViewBinding, ViewCell,
};

fn fruit() -> Rc<Vec<String>> {
    Rc::new(
        ["apple", "apricot", "banana", "cherry"]
            .into_iter()
            .map(String::from)
            .collect(),
    )
}

#[test]
fn test_search_filters_list() {
    let all = fruit();
    let query = ModelProperty::new(String::new());
    let results = {
        let (query, all) = (query.clone(), all.clone());
        ModelProperty::computed(move || {
            let needle = query.get();
            all.iter()
                .filter(|item| item.contains(needle.as_str()))
                .cloned()
                .collect::<Vec<String>>()
        })
    };
    results.depends_on(&query);

    let search_box = Rc::new(ViewCell::echoing(String::new()));
    query.attach(search_box.clone()).unwrap();

    let list = Rc::new(ViewCell::new(BindValue::None));
    results
        .attach(Rc::new(adapters::typed::<Vec<String>>(list.clone())))
        .unwrap();
    assert_eq!(list.get().as_list().map(|l| l.len()), Some(4));

    search_box.input("ap".into()).unwrap();
    assert_eq!(query.get(), "ap");
    assert_eq!(
        list.get(),
        BindValue::List(vec!["apple".into(), "apricot".into()])
    );

    search_box.input("zzz".into()).unwrap();
    assert_eq!(list.get(), BindValue::List(Vec::new()));
}

#[test]
fn test_result_count_in_text_box() {
    let all = fruit();
    let query = ModelProperty::new(String::new());
    let count = {
        let (query, all) = (query.clone(), all.clone());
        ModelProperty::computed(move || all.iter().filter(|i| i.starts_with(&query.get())).count())
    };
    count.depends_on(&query);

    let label = Rc::new(ViewCell::new(String::new()));
    count
        .attach(Rc::new(adapters::parsed::<usize>(label.clone())))
        .unwrap();
    assert_eq!(label.get(), "4");

    query.set("b".into()).unwrap();
    assert_eq!(label.get(), "1");
}

#[test]
fn test_one_reevaluation_per_change() {
    let source = ModelProperty::new(0i64);
    let evaluations = Rc::new(Cell::new(0));
    let doubled = {
        let (source, evaluations) = (source.clone(), evaluations.clone());
        ModelProperty::computed(move || {
            evaluations.set(evaluations.get() + 1);
            source.get() * 2
        })
    };
    doubled.depends_on(&source);

    let notifications = Rc::new(Cell::new(0));
    let _sub = {
        let notifications = notifications.clone();
        doubled.subscribe(move |_| {
            notifications.set(notifications.get() + 1);
            Ok(())
        })
    };
    let views: Vec<_> = (0..4).map(|_| Rc::new(ViewCell::echoing(0i64))).collect();
    for view in &views {
        doubled.attach(view.clone()).unwrap();
    }

    source.set(21).unwrap();
    assert_eq!(notifications.get(), 1);
    assert!(views.iter().all(|v| v.get() == 42));
}

#[derive(Bindable)]
struct Mixer {
    #[bind(min = 0, max = 1)]
    volume: f64,
    #[bind(values = ["drums", "bass", "keys"])]
    tracks: Vec<String>,
}

#[test]
fn test_text_box_edits_discovered_float() {
    let mixer = Rc::new(RefCell::new(Mixer {
        volume: 0.5,
        tracks: Vec::new(),
    }));
    let items = discover(&mixer);

    // text box -> f64 -> BindValue
    let text = Rc::new(ViewCell::new(String::new()));
    let as_float = Rc::new(adapters::parsed::<f64>(text.clone()));
    let erased = adapters::erased::<f64>(as_float);
    let volume = items[0].bind(Rc::new(erased)).unwrap();
    assert_eq!(text.get(), "0.5");

    text.input("0.25".into()).unwrap();
    assert_eq!(mixer.borrow().volume, 0.25);
    assert_eq!(volume.get(), BindValue::Float(0.25));

    // unparsable text never reaches the model
    assert!(text.input("loud".into()).is_err());
    assert_eq!(mixer.borrow().volume, 0.25);
}

#[test]
fn test_slider_on_typed_property() {
    let mixer = Rc::new(RefCell::new(Mixer {
        volume: 0.5,
        tracks: Vec::new(),
    }));
    let items = discover(&mixer);

    let volume = items[0].typed_property::<f64>().unwrap();
    let slider = Rc::new(ViewCell::echoing(0.0));
    volume.attach(slider.clone()).unwrap();
    assert_eq!(slider.get(), 0.5);

    slider.input(0.9).unwrap();
    assert_eq!(mixer.borrow().volume, 0.9);

    volume.set(0.1).unwrap();
    assert_eq!(slider.get(), 0.1);
}

#[test]
fn test_multi_select_through_typed_slot() {
    let mixer = Rc::new(RefCell::new(Mixer {
        volume: 0.5,
        tracks: vec!["drums".into()],
    }));
    let items = discover(&mixer);
    let tracks = &items[1];

    let list = Rc::new(ViewCell::new(BindValue::None));
    let _property = tracks.bind(list.clone()).unwrap();

    let slot = TypedViewSlot::new(list.clone());
    let selected = slot.typed::<Vec<String>>().unwrap();
    assert_eq!(selected.value(), Ok(vec!["drums".to_string()]));

    list.input(BindValue::List(vec!["bass".into(), "keys".into()]))
        .unwrap();
    assert_eq!(mixer.borrow().tracks, vec!["bass", "keys"]);
    assert_eq!(
        selected.value(),
        Ok(vec!["bass".to_string(), "keys".to_string()])
    );

    assert!(slot.typed::<Vec<i32>>().is_err());
}

#[test]
fn test_composed_adapters_round_trip() {
    let inner = Rc::new(ViewCell::new(10i32));
    let text = BindingAdapter::map(
        inner.clone() as Rc<dyn ViewBinding<i32>>,
        |i: &i32| i.to_string(),
        |s: &String| s.parse().unwrap_or_default(),
    );
    let percent = BindingAdapter::map(
        Rc::new(text) as Rc<dyn ViewBinding<String>>,
        |s: &String| format!("{s}%"),
        |s: &String| s.trim_end_matches('%').to_string(),
    );

    let property = ModelProperty::new("50%".to_string());
    property.attach(Rc::new(percent)).unwrap();
    assert_eq!(inner.get(), 50);

    inner.input(75).unwrap();
    assert_eq!(property.get(), "75%");
}
