use super::{AccessError, AccessService, SectionView};

impl AccessService {
    pub async fn create_section(&self, name: &str) -> Result<SectionView, AccessError> {
        let row = self.repo.create_section(name).await?;
        tracing::info!(section_id = %row.id, name, "Section created");
        Ok(row.into())
    }

    pub async fn list_sections(&self) -> Result<Vec<SectionView>, AccessError> {
        let rows = self.repo.list_sections().await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
