//! Method registration.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    future::{self, Future},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    binder::{self, BindFn, Params},
    context::Context,
    error::{RegistryError, RpcError, RpcResult},
    middleware::{HandlerFuture, Next},
};

/// Methods keyed by name, for bulk registration.
pub type Methods = HashMap<String, Method>;

/// A registered handler: how to decode its params and how to call it.
pub struct Method {
    bind: BindFn,
    invoke: Next,
    takes_params: bool,
}

impl Method {
    /// Handler taking params of type `P`.
    ///
    /// Params are decoded with serde before the middleware chain runs; a
    /// decode failure is answered with `invalid_params` and the handler is
    /// not called.
    pub fn with_params<P, R, F, Fut>(handler: F) -> Self
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(Context, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<R>> + Send + 'static,
    {
        let invoke = move |ctx: Context, params: Params| -> HandlerFuture {
            let Some(params) = params.into_decoded::<P>() else {
                return Box::pin(future::ready(Err(RpcError::internal(
                    "params do not match the handler's parameter type",
                ))));
            };
            let call = handler(ctx, params);
            Box::pin(async move { render(call.await) })
        };

        Self {
            bind: binder::typed::<P>(),
            invoke: Next::new(invoke),
            takes_params: true,
        }
    }

    /// Handler without params. Any params sent by the client are ignored.
    pub fn without_params<R, F, Fut>(handler: F) -> Self
    where
        R: Serialize + 'static,
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<R>> + Send + 'static,
    {
        let invoke = move |ctx: Context, _params: Params| -> HandlerFuture {
            let call = handler(ctx);
            Box::pin(async move { render(call.await) })
        };

        Self {
            bind: binder::untyped(),
            invoke: Next::new(invoke),
            takes_params: false,
        }
    }

    /// Returns true if the handler declares a parameter type.
    pub fn takes_params(&self) -> bool {
        self.takes_params
    }

    pub(crate) fn bind(&self, raw: Option<Value>) -> RpcResult<Params> {
        (self.bind)(raw)
    }

    pub(crate) fn invoke(&self, ctx: Context, params: Params) -> HandlerFuture {
        self.invoke.call(ctx, params)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("takes_params", &self.takes_params)
            .finish_non_exhaustive()
    }
}

fn render<R: Serialize>(result: RpcResult<R>) -> RpcResult<Value> {
    let value = result?;
    Ok(serde_json::to_value(value)?)
}

/// Maps method names to handlers.
///
/// Filled during setup and read-only once frozen into a
/// [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<Method>>,
}

impl MethodRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method. Fails if the name is empty or already taken; an
    /// existing registration is never replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        method: Method,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        self.check_name(&name)?;
        self.methods.insert(name, Arc::new(method));
        Ok(())
    }

    /// Registers several methods at once.
    ///
    /// All or nothing: if any name is empty, already registered, or repeated
    /// within `methods`, nothing is registered.
    pub fn register_all<I, N>(&mut self, methods: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (N, Method)>,
        N: Into<String>,
    {
        let methods: Vec<(String, Method)> = methods
            .into_iter()
            .map(|(name, method)| (name.into(), method))
            .collect();

        let mut seen = HashSet::with_capacity(methods.len());
        for (name, _) in &methods {
            self.check_name(name)?;
            if !seen.insert(name.as_str()) {
                return Err(RegistryError::DuplicateMethod(name.clone()));
            }
        }

        self.methods.extend(
            methods
                .into_iter()
                .map(|(name, method)| (name, Arc::new(method))),
        );
        Ok(())
    }

    /// Looks up a method by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<Method>> {
        self.methods.get(name).cloned()
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if no methods are registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn check_name(&self, name: &str) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.methods.contains_key(name) {
            return Err(RegistryError::DuplicateMethod(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[derive(Debug, Deserialize)]
    struct AddParams {
        a: i64,
        b: i64,
    }

    fn add() -> Method {
        Method::with_params(|_ctx: Context, params: AddParams| async move {
            Ok::<_, RpcError>(params.a + params.b)
        })
    }

    fn constant(value: &'static str) -> Method {
        Method::without_params(move |_ctx: Context| async move { Ok::<_, RpcError>(value) })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = MethodRegistry::new();

        assert_ok!(registry.register("Add", add()));

        assert!(registry.contains("Add"));
        assert!(registry.lookup("Add").unwrap().takes_params());
        assert!(registry.lookup("Subtract").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let mut registry = MethodRegistry::new();
        registry.register("Version", constant("v1")).unwrap();

        let error = assert_err!(registry.register("Version", constant("v2")));
        assert_eq!(error, RegistryError::DuplicateMethod("Version".to_string()));

        let method = registry.lookup("Version").unwrap();
        let value = tokio_test::block_on(method.invoke(Context::new(), Params::none())).unwrap();
        assert_eq!(value, json!("v1"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = MethodRegistry::new();
        assert_eq!(
            registry.register("", constant("x")),
            Err(RegistryError::EmptyName)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_all() {
        let mut registry = MethodRegistry::new();
        let mut methods = Methods::new();
        methods.insert("Add".to_string(), add());
        methods.insert("Version".to_string(), constant("v1"));

        assert_ok!(registry.register_all(methods));
        assert_eq!(registry.method_names(), vec!["Add", "Version"]);
    }

    #[test]
    fn test_register_all_is_atomic() {
        let mut registry = MethodRegistry::new();
        registry.register("Version", constant("v1")).unwrap();

        let result = registry.register_all(vec![("Add", add()), ("Version", constant("v2"))]);

        assert_eq!(
            result,
            Err(RegistryError::DuplicateMethod("Version".to_string()))
        );
        assert!(!registry.contains("Add"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_all_rejects_repeats_within_batch() {
        let mut registry = MethodRegistry::new();

        let result = registry.register_all(vec![("Ping", constant("a")), ("Ping", constant("b"))]);

        assert_eq!(result, Err(RegistryError::DuplicateMethod("Ping".to_string())));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_typed_invoke() {
        let method = add();
        let params = method.bind(Some(json!({"a": 2, "b": 3}))).unwrap();

        let value = method.invoke(Context::new(), params).await.unwrap();
        assert_eq!(value, json!(5));
    }

    #[tokio::test]
    async fn test_typed_invoke_without_decoded_params() {
        let error = add()
            .invoke(Context::new(), Params::none())
            .await
            .unwrap_err();

        assert!(!error.is_public());
    }

    #[tokio::test]
    async fn test_unserializable_result_is_internal() {
        let method = Method::without_params(|_ctx: Context| async {
            let mut map = HashMap::new();
            map.insert(vec![1u8], "non-string key");
            Ok::<_, RpcError>(map)
        });

        let error = method
            .invoke(Context::new(), Params::none())
            .await
            .unwrap_err();
        assert!(!error.is_public());
    }
}
