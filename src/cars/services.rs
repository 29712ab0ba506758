use anyhow::Context;
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use super::repo;
use crate::state::AppState;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

/// Upload each image to the object store, then link all rows in one
/// transaction so a failed insert never leaves half a gallery.
pub async fn upload_and_link_images(
    st: &AppState,
    car_id: Uuid,
    images: Vec<UploadItem>,
) -> anyhow::Result<Vec<Uuid>> {
    anyhow::ensure!(!images.is_empty(), "no images provided");

    struct Obj {
        id: Uuid,
        key: String,
    }
    let mut objs = Vec::with_capacity(images.len());
    for img in images {
        let id = Uuid::new_v4();
        let ext = ext_from_mime(&img.content_type).unwrap_or("bin");
        let key = format!("cars/{}/{}.{}", car_id, id, ext);
        st.storage
            .put_object(&key, img.body, &img.content_type)
            .await
            .with_context(|| format!("put_object {}", key))?;
        objs.push(Obj { id, key });
    }

    let mut tx = st.db.begin().await.context("begin tx")?;
    for o in &objs {
        repo::insert_image_tx(&mut tx, o.id, car_id, &o.key).await?;
    }
    tx.commit().await.context("commit tx")?;

    Ok(objs.into_iter().map(|o| o.id).collect())
}

pub async fn presign_many(
    st: &AppState,
    keys: Vec<String>,
    expires_seconds: u64,
) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::with_capacity(keys.len());
    for k in keys {
        out.push(st.storage.presign_get(&k, expires_seconds).await?);
    }
    Ok(out)
}

/// Delete the car row, then sweep its objects out of storage. Storage
/// failures are logged, not surfaced; the rows are already gone.
pub async fn delete_car_with_images(st: &AppState, car_id: Uuid) -> anyhow::Result<bool> {
    let keys = repo::list_image_keys(&st.db, car_id).await?;
    if !repo::delete(&st.db, car_id).await? {
        return Ok(false);
    }
    for (_, key) in keys {
        if let Err(e) = st.storage.delete_object(&key).await {
            warn!(error = %e, %key, "failed to delete car image object");
        }
    }
    Ok(true)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use crate::state::AppState;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(super::ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/png"), Some("png"));
        assert_eq!(super::ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(super::ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(super::ext_from_mime("application/octet-stream"), None);
        assert_eq!(super::ext_from_mime("whatever/else"), None);
    }

    #[tokio::test]
    async fn test_presign_many() {
        let state = AppState::fake();

        let urls = super::presign_many(
            &state,
            vec!["cars/a/b.jpg".into(), "cars/x/y.png".into()],
            1800,
        )
        .await
        .unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("cars/a/b.jpg"));
        assert!(urls[1].contains("cars/x/y.png"));
    }
}
