#[cfg(test)]
mod value_tests {
    use crate::vm::value::{Value, format_float};
    use expect_test::expect;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_value(v: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        v.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn integer_and_integral_float_are_equal() {
        assert_eq!(Value::Integer(3), Value::number(3.0));
        assert_ne!(Value::Integer(3), Value::number(3.5));
        assert_eq!(hash_value(&Value::Integer(3)), hash_value(&Value::number(3.0)));
    }

    #[test]
    fn reference_types_compare_by_identity() {
        let a = Value::Table(crate::vm::TableRef::new());
        let b = Value::Table(crate::vm::TableRef::new());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn only_nil_and_false_are_falsy() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn integer_coercion() {
        assert_eq!(Value::Integer(7).to_integer(), Some(7));
        assert_eq!(Value::number(7.0).to_integer(), Some(7));
        assert_eq!(Value::number(7.5).to_integer(), None);
        assert_eq!(Value::string(" 12 ").to_integer(), Some(12));
        assert_eq!(Value::string("3.0").to_integer(), Some(3));
        assert_eq!(Value::string("abc").to_integer(), None);
        assert_eq!(Value::number(f64::NAN).to_integer(), None);
        assert_eq!(Value::number(9.3e18).to_integer(), None);
    }

    #[test]
    fn float_formatting() {
        let rendered: Vec<String> = [3.0, 0.1, 2.5, -0.0, 1e15, 1e100, 1.0 / 3.0, 1e-5, 123456.789]
            .into_iter()
            .map(format_float)
            .collect();
        expect![[r#"["3.0", "0.1", "2.5", "-0.0", "1e+15", "1e+100", "0.33333333333333", "1e-05", "123456.789"]"#]]
            .assert_eq(&format!("{rendered:?}"));
    }

    #[test]
    fn non_finite_formatting() {
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_float(f64::NAN), "nan");
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::Nil.type_name(), "nil");
        assert_eq!(Value::number(1.5).type_name(), "number");
        assert_eq!(Value::Integer(1).type_name(), "number");
        assert_eq!(Value::userdata(None).type_name(), "userdata");
        assert_eq!(Value::function("f", |_, _| Ok(Vec::new())).type_name(), "function");
    }
}

#[cfg(test)]
mod table_tests {
    use crate::vm::{Table, Value};
    use expect_test::expect;

    #[test]
    fn append_migrates_following_keys() {
        let mut t = Table::new();
        t.set_int(3, Value::Integer(30));
        t.set_int(2, Value::Integer(20));
        assert_eq!(t.border(), 0);

        t.set_int(1, Value::Integer(10));
        assert_eq!(t.border(), 3);
        assert_eq!(t.hash_len(), 0);
    }

    #[test]
    fn clearing_the_last_element_shrinks_the_border() {
        let mut t = Table::from_values([1, 2, 3].map(Value::Integer));
        t.set_int(2, Value::Nil);
        assert_eq!(t.border(), 3);

        t.set_int(3, Value::Nil);
        assert_eq!(t.border(), 1);
    }

    #[test]
    fn trailing_nils_are_not_counted() {
        let t = Table::from_values([Value::Integer(1), Value::Nil, Value::Nil]);
        assert_eq!(t.border(), 1);
    }

    #[test]
    fn integral_float_keys_are_normalised() {
        let mut t = Table::new();
        t.set(Value::number(1.0), Value::string("one")).unwrap();
        assert_eq!(t.border(), 1);
        assert_eq!(t.get(&Value::Integer(1)), Value::string("one"));
        assert_eq!(t.get(&Value::number(1.0)), Value::string("one"));
    }

    #[test]
    fn string_and_float_keys_live_in_the_hash_part() {
        let mut t = Table::new();
        t.set_str("n", Value::Integer(1));
        t.set(Value::number(0.5), Value::Boolean(true)).unwrap();
        assert_eq!(t.border(), 0);
        assert_eq!(t.hash_len(), 2);
        assert_eq!(t.get_str("n"), Value::Integer(1));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let mut t = Table::new();
        let nil = t.set(Value::Nil, Value::Integer(1)).unwrap_err();
        let nan = t.set(Value::number(f64::NAN), Value::Integer(1)).unwrap_err();
        expect!["runtime error: index is nil"].assert_eq(&nil.to_string());
        expect!["runtime error: index is NaN"].assert_eq(&nan.to_string());
    }
}

#[cfg(test)]
mod runtime_tests {
    use crate::error::ErrorKind;
    use crate::vm::{Limits, Table, TableRef, VM, Value};
    use expect_test::expect;

    fn table_with_meta(meta: Table) -> Value {
        let t = TableRef::new();
        t.borrow_mut().set_metatable(Some(meta.into_ref()));
        Value::Table(t)
    }

    #[test]
    fn index_falls_back_to_table_hook() {
        let mut vm = VM::new();
        let defaults = Table::from_values([Value::string("default")]).into_ref();
        let mut meta = Table::new();
        meta.set_str("__index", Value::Table(defaults));
        let t = table_with_meta(meta);

        assert_eq!(vm.get_int(&t, 1).unwrap(), Value::string("default"));
        assert_eq!(vm.get_int(&t, 2).unwrap(), Value::Nil);
    }

    #[test]
    fn index_calls_function_hook_with_object_and_key() {
        let mut vm = VM::new();
        let mut meta = Table::new();
        meta.set_str(
            "__index",
            Value::function("__index", |_, args| {
                let key = args[1].to_integer().unwrap_or(0);
                Ok(vec![Value::Integer(key * 10)])
            }),
        );
        let t = table_with_meta(meta);

        assert_eq!(vm.get_int(&t, 4).unwrap(), Value::Integer(40));
    }

    #[test]
    fn newindex_hook_only_fires_for_absent_keys() {
        let mut vm = VM::new();
        let sink = TableRef::new();
        let mut meta = Table::new();
        meta.set_str("__newindex", Value::Table(sink.clone()));
        let t = table_with_meta(meta);
        let Value::Table(raw) = &t else { unreachable!() };
        raw.borrow_mut().set_int(1, Value::Integer(1));

        vm.set_int(&t, 1, Value::Integer(100)).unwrap();
        vm.set_int(&t, 2, Value::Integer(200)).unwrap();

        assert_eq!(raw.borrow().get_int(1), Value::Integer(100));
        assert_eq!(raw.borrow().get_int(2), Value::Nil);
        assert_eq!(sink.borrow().get_int(2), Value::Integer(200));
    }

    #[test]
    fn indexing_a_plain_value_fails() {
        let mut vm = VM::new();
        let err = vm.get_int(&Value::Integer(3), 1).unwrap_err();
        assert!(err.is(ErrorKind::Type));
        expect!["type error: attempt to index a number value"].assert_eq(&err.to_string());
    }

    #[test]
    fn index_chain_loop_is_detected() {
        let mut vm = VM::with_limits(Limits {
            max_meta_chain: 10,
            ..Limits::default()
        });
        let t = TableRef::new();
        let mut meta = Table::new();
        meta.set_str("__index", Value::Table(t.clone()));
        t.borrow_mut().set_metatable(Some(meta.into_ref()));

        let err = vm.get_int(&Value::Table(t), 1).unwrap_err();
        expect!["runtime error: '__index' chain too long; possible loop"].assert_eq(&err.to_string());
    }

    #[test]
    fn length_prefers_hook() {
        let mut vm = VM::new();
        let mut meta = Table::new();
        meta.set_str("__len", Value::function("__len", |_, _| Ok(vec![Value::Integer(42)])));
        let t = table_with_meta(meta);

        assert_eq!(vm.length(&t).unwrap(), Value::Integer(42));
        assert_eq!(vm.raw_len(&t), Some(0));
        assert_eq!(vm.length(&Value::string("abc")).unwrap(), Value::Integer(3));
        assert!(vm.length(&Value::Boolean(true)).is_err());
    }

    #[test]
    fn less_than_on_mixed_numbers() {
        let mut vm = VM::new();
        assert!(vm.less_than(&Value::Integer(1), &Value::number(1.5)).unwrap());
        assert!(!vm.less_than(&Value::number(1.5), &Value::Integer(1)).unwrap());
        assert!(vm.less_than(&Value::Integer(i64::MAX), &Value::number(9.3e18)).unwrap());
        assert!(!vm.less_than(&Value::number(f64::NAN), &Value::Integer(1)).unwrap());
        assert!(!vm.less_than(&Value::Integer(1), &Value::number(f64::NAN)).unwrap());
        assert!(vm.less_than(&Value::Integer(1), &Value::number(f64::INFINITY)).unwrap());
        assert!(vm.less_than(&Value::string("a"), &Value::string("b")).unwrap());
    }

    #[test]
    fn less_than_uses_lt_hook() {
        let mut vm = VM::new();
        let mut meta = Table::new();
        meta.set_str("__lt", Value::function("__lt", |_, _| Ok(vec![Value::Boolean(true)])));
        let object = Value::userdata(Some(meta.into_ref()));

        assert!(vm.less_than(&object, &Value::Integer(1)).unwrap());
        assert!(vm.less_than(&Value::Integer(1), &object).unwrap());
    }

    #[test]
    fn incomparable_values_fail() {
        let mut vm = VM::new();
        let same = vm.less_than(&Value::Nil, &Value::Nil).unwrap_err();
        let mixed = vm.less_than(&Value::Integer(1), &Value::string("x")).unwrap_err();
        expect!["type error: attempt to compare two nil values"].assert_eq(&same.to_string());
        expect!["type error: attempt to compare number with string"].assert_eq(&mixed.to_string());
    }

    #[test]
    fn call_depth_is_limited() {
        let mut vm = VM::with_limits(Limits {
            max_call_depth: 16,
            ..Limits::default()
        });
        assert_eq!(vm.limits().max_call_depth, 16);
        let recurse = Value::function("recurse", |vm, _| {
            let me = vm.get_global("recurse");
            vm.call(&me, &[])
        });
        vm.set_global("recurse", recurse.clone());

        let err = vm.call(&recurse, &[]).unwrap_err();
        expect!["runtime error: stack overflow"].assert_eq(&err.to_string());

        // the depth counter unwinds with the error
        let ok = Value::function("ok", |_, _| Ok(vec![Value::Integer(1)]));
        assert_eq!(vm.pcall(&ok, &[]).unwrap(), Value::Integer(1));
    }

    #[test]
    fn call_hook_receives_the_object_first() {
        let mut vm = VM::new();
        let mut meta = Table::new();
        meta.set_str(
            "__call",
            Value::function("__call", |_, args| Ok(vec![Value::Integer(args.len() as i64)])),
        );
        let object = Value::userdata(Some(meta.into_ref()));

        assert_eq!(vm.pcall(&object, &[Value::Nil, Value::Nil]).unwrap(), Value::Integer(3));
        assert!(vm.call(&Value::Integer(1), &[]).is_err());
    }

    #[test]
    fn metatables_only_attach_to_tables_and_userdata() {
        let mut vm = VM::new();
        let meta = TableRef::new();
        assert!(vm.set_metatable(&Value::userdata(None), Some(meta.clone())).is_ok());
        assert!(vm.set_metatable(&Value::Table(TableRef::new()), Some(meta.clone())).is_ok());
        assert!(vm.set_metatable(&Value::Integer(1), Some(meta)).is_err());
    }
}
