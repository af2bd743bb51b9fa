use crate::error::{Result, ScanError};
use crate::page::Page;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use tracing::{debug, info};

/// Text of the text and element child nodes of `arguments[0]`; WebDriver
/// cannot address text nodes directly.
const CHILD_TEXTS_SCRIPT: &str = r#"
return Array.from(arguments[0].childNodes)
    .filter(n => n.nodeType === Node.TEXT_NODE || n.nodeType === Node.ELEMENT_NODE)
    .map(n => (n.textContent || '').trim())
    .filter(t => t.length > 0);
"#;

/// A browser session driven over WebDriver.
#[derive(Clone)]
pub struct WebDriverPage {
    client: Client,
}

impl WebDriverPage {
    /// Connect to a running WebDriver server (geckodriver, chromedriver)
    pub async fn connect(webdriver_url: &str) -> Result<Self> {
        info!("Connecting to WebDriver at {}", webdriver_url);
        let client = ClientBuilder::native().connect(webdriver_url).await?;
        info!("WebDriver session established");
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

#[async_trait]
impl Page for WebDriverPage {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    async fn query_all(&self, css: &str) -> Result<Vec<Element>> {
        Ok(self.client.find_all(Locator::Css(css)).await?)
    }

    async fn query_within(&self, scope: &Element, css: &str) -> Result<Vec<Element>> {
        Ok(scope.find_all(Locator::Css(css)).await?)
    }

    async fn children(&self, element: &Element) -> Result<Vec<Element>> {
        Ok(element.find_all(Locator::XPath("./*")).await?)
    }

    async fn child_texts(&self, element: &Element) -> Result<Vec<String>> {
        let argument = serde_json::to_value(element)?;
        let value = self
            .client
            .execute(CHILD_TEXTS_SCRIPT, vec![argument])
            .await?;
        serde_json::from_value(value)
            .map_err(|e| ScanError::ParseError(format!("Unexpected child text result: {}", e)))
    }

    async fn text(&self, element: &Element) -> Result<String> {
        Ok(element.prop("textContent").await?.unwrap_or_default())
    }

    async fn attr(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attr(name).await?)
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.click().await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn back(&self) -> Result<()> {
        self.client.back().await?;
        Ok(())
    }
}
