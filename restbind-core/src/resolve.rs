use http::Method;
use serde::de::DeserializeOwned;

use crate::binding::MethodBinding;
use crate::error::Error;
use crate::state::InvocationState;
use crate::transport::{ResolvedRequest, Transport};
use crate::value::Payload;

/// Effective media types for the response: the method's declaration wins
/// over the type-level default, neither means unrestricted.
pub fn effective_produces<'a>(
    binding: &'a MethodBinding,
    class_produces: Option<&'a [String]>,
) -> &'a [String] {
    binding
        .produces
        .as_deref()
        .or(class_produces)
        .unwrap_or(&[])
}

/**
Turns a fully populated invocation state into a request and submits it
through the transport. Only terminal dispatches come here; the state is
consumed exactly once.
*/
pub fn resolve<T, R>(
    transport: &T,
    binding: &MethodBinding,
    class_produces: Option<&[String]>,
    state: InvocationState<T::Target>,
) -> Result<R, Error>
where
    T: Transport,
    R: DeserializeOwned,
{
    let InvocationState {
        mut target,
        paths,
        queries,
        matrices,
        headers,
        cookies,
        forms,
        entity,
    } = state;

    transport.resolve_templates(&mut target, &paths);
    for (name, values) in &queries {
        transport.add_query(&mut target, name, values);
    }
    for (name, values) in &matrices {
        transport.add_matrix(&mut target, name, values);
    }

    // form parameters and an entity parameter are mutually exclusive;
    // the check runs before anything is submitted
    let entity = if forms.is_empty() {
        entity
    } else if entity.is_some() {
        return Err(Error::RequestConflict {
            method: binding.name.clone(),
        });
    } else {
        Some(Payload::Form(forms))
    };

    let content_type = entity.as_ref().map(|payload| match &binding.consumes {
        Some(consumes) if !consumes.is_empty() => {
            if consumes.len() > 1 {
                log::debug!(
                    "method '{}' declares {} consumed media types, only the first is sent",
                    binding.name,
                    consumes.len()
                );
            }
            consumes[0].clone()
        }
        _ => payload.media_type().to_string(),
    });

    let method = binding.verb.clone().unwrap_or(Method::GET);
    log::debug!("resolved {} request for method '{}'", method, binding.name);

    let request = ResolvedRequest {
        target,
        method,
        accept: effective_produces(binding, class_produces),
        headers: &headers,
        cookies: &cookies,
        content_type,
        entity,
    };
    Ok(transport.submit(request)?)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::transport::recording::RecordingTransport;

    use super::*;

    fn bare_binding(name: &str, verb: Option<Method>) -> MethodBinding {
        MethodBinding {
            name: name.to_string(),
            verb,
            path: None,
            params: Vec::new(),
            produces: None,
            consumes: None,
            returns: None,
            locates: None,
            is_locator: false,
        }
    }

    fn state_for(
        transport: &RecordingTransport,
    ) -> InvocationState<crate::transport::uri::UriTarget> {
        InvocationState::new(transport.target("http://t/api"))
    }

    #[test]
    fn test_verb_falls_back_to_get() -> anyhow::Result<()> {
        let transport = RecordingTransport::new();
        let binding = bare_binding("bare", None);

        let _: serde_json::Value = resolve(&transport, &binding, None, state_for(&transport))?;

        assert_eq!(transport.exchanges()[0].method, Method::GET);
        Ok(())
    }

    #[test]
    fn test_produces_tiers() {
        let class = vec!["text/plain".to_string()];
        let mut binding = bare_binding("m", Some(Method::GET));

        assert!(effective_produces(&binding, None).is_empty());
        assert_eq!(effective_produces(&binding, Some(&class)), ["text/plain"]);

        binding.produces = Some(vec!["application/json".to_string()]);
        assert_eq!(
            effective_produces(&binding, Some(&class)),
            ["application/json"]
        );
    }

    #[test]
    fn test_form_params_become_the_entity() -> anyhow::Result<()> {
        let transport = RecordingTransport::new();
        let binding = bare_binding("submit", Some(Method::POST));
        let mut state = state_for(&transport);
        state.apply_form("name", "bolt".to_string());
        state.apply_form("name", "nut".to_string());

        let _: serde_json::Value = resolve(&transport, &binding, None, state)?;

        let exchange = &transport.exchanges()[0];
        assert_eq!(
            exchange.content_type.as_deref(),
            Some("application/x-www-form-urlencoded")
        );
        match &exchange.entity {
            Some(Payload::Form(map)) => assert_eq!(map["name"], vec!["bolt", "nut"]),
            other => panic!("expected form payload, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_form_and_entity_conflict() {
        let transport = RecordingTransport::new();
        let binding = bare_binding("submit", Some(Method::POST));
        let mut state = state_for(&transport);
        state.apply_form("name", "bolt".to_string());
        state.apply_entity(Payload::Text("body".to_string()));

        let result: Result<serde_json::Value, _> = resolve(&transport, &binding, None, state);
        match result {
            Err(Error::RequestConflict { method }) => assert_eq!(method, "submit"),
            other => panic!("expected RequestConflict, got {other:?}"),
        }
        // the conflict is detected before the transport sees the request
        assert_eq!(transport.exchange_count(), 0);
    }

    #[test]
    fn test_consumes_overrides_payload_media_type() -> anyhow::Result<()> {
        let transport = RecordingTransport::new();
        let mut binding = bare_binding("put_raw", Some(Method::PUT));
        binding.consumes = Some(vec!["application/xml".to_string()]);
        let mut state = state_for(&transport);
        state.apply_entity(Payload::Text("<a/>".to_string()));

        let _: serde_json::Value = resolve(&transport, &binding, None, state)?;

        let exchange = &transport.exchanges()[0];
        assert_eq!(exchange.content_type.as_deref(), Some("application/xml"));
        Ok(())
    }

    #[test]
    fn test_accept_reaches_the_wire() -> anyhow::Result<()> {
        let transport = RecordingTransport::new();
        let binding = bare_binding("list", Some(Method::GET));
        let class = vec!["application/json".to_string()];

        let _: serde_json::Value =
            resolve(&transport, &binding, Some(&class), state_for(&transport))?;

        assert_eq!(transport.exchanges()[0].accept, ["application/json"]);
        Ok(())
    }
}
