//! The negotiation engine.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use http::header::{CONTENT_TYPE, LOCATION, VARY};
use http::{HeaderValue, Request, Response, StatusCode};
use inertia_core::{
    header_names, is_inertia_request, request_url, InertiaConfig, Page, PartialFilter, Props,
    RequestScope, SsrConfig, ViewData, DEFAULT_SSR_URL,
};
use inertia_render::{
    BasicEngine, Output, TemplateCache, TemplateEngine, TemplateFn, TemplateFs,
    TemplateSource,
};
use inertia_ssr::{HttpSsrRenderer, SsrRenderer};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::InertiaError;
use crate::middleware::VersionGuardLayer;
use crate::store::SharedState;

/// View-data key holding the page.
pub const PAGE_KEY: &str = "page";

/// View-data key holding the SSR reply, `null` when SSR is off.
pub const SSR_KEY: &str = "ssr";

/// Builds pages and answers with either a JSON payload or the HTML document.
///
/// Configure it before serving; afterwards it is shared by reference across
/// requests.
///
/// # Example
///
/// ```rust,ignore
/// let inertia = Inertia::new("https://shop.test", "views/app.html", "v42");
/// inertia.share("appName", "Shop");
///
/// let mut props = Props::new();
/// props.insert("userID".into(), 1.into());
/// let response = inertia.render(&request, "users/show", props).await?;
/// ```
pub struct Inertia {
    config: InertiaConfig,
    shared: ArcSwap<SharedState>,
    template: TemplateSource,
    cache: TemplateCache,
    engine: Arc<dyn TemplateEngine>,
    ssr: Option<Arc<dyn SsrRenderer>>,
}

impl Inertia {
    /// Create an engine reading the root template from the local filesystem.
    pub fn new(
        url: impl Into<String>,
        root_template: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let config = InertiaConfig::new(url, root_template, version);
        let template = TemplateSource::file(&config.root_template);
        Self::build(config, template)
    }

    /// Create an engine reading the root template from `fs`.
    pub fn with_fs(
        url: impl Into<String>,
        root_template: impl Into<String>,
        version: impl Into<String>,
        fs: Arc<dyn TemplateFs>,
    ) -> Self {
        let config = InertiaConfig::new(url, root_template, version);
        let template = TemplateSource::embedded(fs, config.root_template.clone());
        Self::build(config, template)
    }

    /// Create an engine from configuration, enabling SSR if configured.
    ///
    /// The configuration is validated first.
    pub fn from_config(config: InertiaConfig) -> Result<Self, InertiaError> {
        config
            .validate()
            .map_err(|e| InertiaError::Config(format!("{e:#}")))?;
        let template = TemplateSource::file(&config.root_template);
        let ssr = config.ssr.clone();
        let mut inertia = Self::build(config, template);
        if let Some(ssr) = ssr {
            inertia.enable_ssr_with_config(ssr)?;
        }
        Ok(inertia)
    }

    fn build(config: InertiaConfig, template: TemplateSource) -> Self {
        Self {
            config: InertiaConfig { ssr: None, ..config },
            shared: ArcSwap::from_pointee(SharedState::new()),
            template,
            cache: TemplateCache::new(),
            engine: Arc::new(BasicEngine::new()),
            ssr: None,
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Current configuration.
    pub fn config(&self) -> &InertiaConfig {
        &self.config
    }

    /// Public base URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Asset version stamped on every page.
    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Where the root template is read from.
    pub fn template_source(&self) -> &TemplateSource {
        &self.template
    }

    /// Use a different template engine.
    pub fn set_template_engine(&mut self, engine: impl TemplateEngine + 'static) {
        self.engine = Arc::new(engine);
        self.cache.invalidate();
    }

    /// Read the root template from `fs` from now on.
    pub fn set_template_fs(&mut self, fs: Arc<dyn TemplateFs>) {
        self.template = self.template.with_fs(fs);
        self.cache.invalidate();
    }

    /// Point at another root template.
    pub fn set_root_template(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.template = self.template.with_path(path.clone());
        self.config.root_template = path;
        self.cache.invalidate();
    }

    /// Forget the compiled root template; the next HTML response reloads it.
    pub fn reload_template(&self) {
        self.cache.invalidate();
    }

    /// Render through the SSR sidecar at `url`.
    pub fn enable_ssr(&mut self, url: impl Into<String>) -> Result<(), InertiaError> {
        self.enable_ssr_with_config(SsrConfig::new(url))
    }

    /// Render through the SSR sidecar on its default address.
    pub fn enable_ssr_with_default(&mut self) -> Result<(), InertiaError> {
        self.enable_ssr(DEFAULT_SSR_URL)
    }

    /// Render through the SSR sidecar described by `config`.
    pub fn enable_ssr_with_config(&mut self, config: SsrConfig) -> Result<(), InertiaError> {
        config
            .validate()
            .map_err(|e| InertiaError::Config(format!("{e:#}")))?;
        let renderer = HttpSsrRenderer::from_config(&config)?;
        info!(ssr_url = %renderer.endpoint(), "SSR enabled");
        self.ssr = Some(Arc::new(renderer));
        self.config.ssr = Some(config);
        Ok(())
    }

    /// Render through a custom SSR implementation.
    ///
    /// Clears `config().ssr`, which only describes the built-in HTTP client.
    pub fn set_ssr_renderer(&mut self, renderer: Arc<dyn SsrRenderer>) {
        self.ssr = Some(renderer);
        self.config.ssr = None;
    }

    /// Stop calling the SSR sidecar.
    pub fn disable_ssr(&mut self) {
        self.ssr = None;
        self.config.ssr = None;
    }

    pub fn is_ssr_enabled(&self) -> bool {
        self.ssr.is_some()
    }

    /// Middleware enforcing this engine's asset version.
    pub fn version_guard(&self) -> VersionGuardLayer {
        VersionGuardLayer::new(&self.config.url, &self.config.version)
    }

    // ------------------------------------------------------------------
    // Shared state
    // ------------------------------------------------------------------

    /// Snapshot of the shared state.
    pub fn shared(&self) -> Arc<SharedState> {
        self.shared.load_full()
    }

    /// Share a prop with every page.
    pub fn share(&self, key: impl Into<String>, value: impl Into<Value>) {
        let (key, value) = (key.into(), value.into());
        self.shared.rcu(|state| state.with_prop(&key, &value));
    }

    /// Share view data with every HTML document.
    pub fn share_view_data(&self, key: impl Into<String>, value: impl Into<Value>) {
        let (key, value) = (key.into(), value.into());
        self.shared.rcu(|state| state.with_view_data(&key, &value));
    }

    /// Make a function available to the root template.
    pub fn share_func<F>(&self, name: impl Into<String>, func: F)
    where
        F: Fn(&Value) -> Result<Output, String> + Send + Sync + 'static,
    {
        let name = name.into();
        let func: Arc<TemplateFn> = Arc::new(func);
        self.shared.rcu(|state| state.with_func(&name, &func));
    }

    // ------------------------------------------------------------------
    // Request scope
    // ------------------------------------------------------------------

    /// Attach a prop to this request only.
    pub fn with_prop<B>(req: &mut Request<B>, key: impl Into<String>, value: impl Into<Value>) {
        RequestScope::get_or_insert(req.extensions_mut()).insert_prop(key, value);
    }

    /// Attach view data to this request only.
    pub fn with_view_data<B>(
        req: &mut Request<B>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        RequestScope::get_or_insert(req.extensions_mut()).insert_view_data(key, value);
    }

    // ------------------------------------------------------------------
    // Responses
    // ------------------------------------------------------------------

    /// Build the page for `component`.
    ///
    /// Props are merged shared, then request-scoped, then `props`; later
    /// layers win. Keys outside an active partial filter are skipped.
    pub fn page<B>(&self, req: &Request<B>, component: &str, props: Props) -> Page {
        let filter = PartialFilter::from_headers(req.headers(), component);
        let mut page = Page::new(component, request_url(req.uri()), &self.config.version);

        let shared = self.shared.load_full();
        let scoped = RequestScope::get(req.extensions()).and_then(RequestScope::props);

        for layer in [Some(shared.props()), scoped, Some(&props)].into_iter().flatten() {
            for (key, value) in layer {
                if filter.allows(key) {
                    page.props.insert(key.clone(), value.clone());
                }
            }
        }

        if !filter.is_empty() {
            debug!(
                component,
                partial_keys = ?filter.keys().collect::<Vec<_>>(),
                "Partial reload"
            );
        }

        page
    }

    /// Answer the request with `component`.
    ///
    /// In-protocol navigations get the page as JSON; anything else gets the
    /// root template rendered with the page inlined.
    #[tracing::instrument(
        name = "inertia.render",
        skip_all,
        fields(component = %component, url = %req.uri(), mode)
    )]
    pub async fn render<B>(
        &self,
        req: &Request<B>,
        component: &str,
        props: Props,
    ) -> Result<Response<Vec<u8>>, InertiaError> {
        let page = self.page(req, component, props);

        if is_inertia_request(req.headers()) {
            tracing::Span::current().record("mode", "json");
            return json_response(&page);
        }

        tracing::Span::current().record("mode", "html");
        let context = self.build_document_context(req, &page).await?;
        let html = self.execute_template(&context)?;

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/html")
            .body(html.into_bytes())?;
        Ok(response)
    }

    /// Build the data handed to the root template.
    ///
    /// Shared view data, then request-scoped view data, then the page under
    /// [`PAGE_KEY`] and the SSR reply under [`SSR_KEY`].
    pub async fn build_document_context<B>(
        &self,
        req: &Request<B>,
        page: &Page,
    ) -> Result<ViewData, InertiaError> {
        let scope = RequestScope::get(req.extensions());

        let mut context = self.shared.load_full().view_data().clone();
        if let Some(view_data) = scope.and_then(RequestScope::view_data) {
            context.extend(view_data.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        context.insert(PAGE_KEY.to_string(), serde_json::to_value(page)?);

        let ssr = match &self.ssr {
            Some(renderer) => {
                let budget = scope.and_then(RequestScope::remaining);
                let reply = renderer.render(page, budget).await?;
                debug!(component = %page.component, head = reply.head.len(), "SSR rendered");
                serde_json::to_value(reply)?
            }
            None => Value::Null,
        };
        context.insert(SSR_KEY.to_string(), ssr);

        Ok(context)
    }

    fn execute_template(&self, context: &ViewData) -> Result<String, InertiaError> {
        let template = self.cache.get_or_compile(&self.template, self.engine.as_ref())?;
        let shared = self.shared.load_full();
        Ok(template.execute(context, shared.funcs())?)
    }

    /// Send the client to `url`, outside the client-side router if needed.
    ///
    /// In-protocol navigations get `409` with `X-Inertia-Location` so the
    /// client does a full visit; other requests get a plain `302`.
    pub fn redirect<B>(
        &self,
        req: &Request<B>,
        url: &str,
    ) -> Result<Response<Vec<u8>>, InertiaError> {
        let location = HeaderValue::from_str(url)?;

        let response = if is_inertia_request(req.headers()) {
            Response::builder()
                .status(StatusCode::CONFLICT)
                .header(header_names::X_INERTIA_LOCATION, location)
                .body(Vec::new())?
        } else {
            Response::builder()
                .status(StatusCode::FOUND)
                .header(LOCATION, location)
                .body(Vec::new())?
        };

        debug!(status = response.status().as_u16(), location = url, "Redirect");
        Ok(response)
    }
}

fn json_response(page: &Page) -> Result<Response<Vec<u8>>, InertiaError> {
    let body = page.to_json()?;
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header_names::X_INERTIA, "true")
        .header(CONTENT_TYPE, "application/json")
        .header(VARY, "Accept")
        .body(body)?;
    Ok(response)
}

impl fmt::Debug for Inertia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inertia")
            .field("config", &self.config)
            .field("template", &self.template)
            .field("cache", &self.cache)
            .field("ssr_enabled", &self.is_ssr_enabled())
            .finish()
    }
}
